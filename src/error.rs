//! Typed error definitions for signal validation and submission.
//!
//! `ValidationError` covers everything that can be rejected locally before
//! a network round trip; `SubmissionError` covers the remote half. Both
//! implement `std::error::Error` via `thiserror` and so compose with
//! `anyhow::Result` in the binary plumbing.

use chrono::NaiveDate;
use thiserror::Error;

/// Local, pre-network rejection of a trade intent. Never sent over the
/// wire; always recoverable by fixing the intent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("quantity must be greater than zero")]
    ZeroQuantity,

    #[error("a limit price is required for limit orders")]
    MissingLimitPrice,

    #[error("a stop price is required for stop orders")]
    MissingStopPrice,

    #[error("a {given} price does not apply to {order_type} orders")]
    ConflictingPrice {
        given: &'static str,
        order_type: &'static str,
    },

    #[error("price must be greater than zero, got {0}")]
    NonPositivePrice(f64),

    #[error("option orders need option type, strike and expiry together")]
    IncompleteOption,

    #[error("strike must be greater than zero, got {0}")]
    InvalidStrike(f64),

    #[error("option expiry {0} is in the past")]
    ExpiredOption(NaiveDate),

    #[error("unrecognized expiry date: {0}")]
    UnparseableExpiry(String),

    #[error("inverted bracket: {0}")]
    InvertedBracket(String),

    #[error("bracket legs are only valid on an opening order")]
    BracketOnNonOpening,

    #[error("cancel-replace target {0} is not a working order")]
    StaleReplaceTarget(i64),
}

/// Remote rejection or transport failure during submission or cancel.
/// Never retried automatically; retrying is an explicit operator action.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The request never completed; the order did not enter the working
    /// set. The operator should refresh before retrying to avoid a
    /// duplicate submission.
    #[error("transport failure, nothing was submitted: {0}")]
    Transport(String),

    /// The platform accepted the request and said no. The reason is the
    /// platform's own text, verbatim.
    #[error("rejected by the platform: {0}")]
    Rejected(String),

    /// Cancel-replace only: the cancel of the old order could not be
    /// confirmed, so the replacement was not submitted.
    #[error("cancel of signal {0} could not be confirmed; replacement not submitted")]
    CancelUnconfirmed(i64),
}

impl From<reqwest::Error> for SubmissionError {
    fn from(e: reqwest::Error) -> Self {
        SubmissionError::Transport(e.to_string())
    }
}
