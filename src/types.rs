//! Core domain types for instruments, positions, quotes, signals and orders.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::utils::occ_symbol;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// The closing side for a position opened with `self`.
    pub fn opposite(self) -> Self {
        match self {
            TradeAction::Buy => TradeAction::Sell,
            TradeAction::Sell => TradeAction::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SecurityKind {
    Equity,
    Option,
    Future,
    Forex,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptionRight {
    Call,
    Put,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionSpec {
    pub underlying: String,
    pub right: OptionRight,
    pub strike: f64,
    pub expiry: NaiveDate,
}

/// A tradeable instrument. Option details are present exactly when
/// `kind == SecurityKind::Option`; the constructors are the only way to
/// build one, so the pairing cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    symbol: String,
    kind: SecurityKind,
    option: Option<OptionSpec>,
}

impl Instrument {
    pub fn equity(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            kind: SecurityKind::Equity,
            option: None,
        }
    }

    pub fn future(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            kind: SecurityKind::Future,
            option: None,
        }
    }

    pub fn forex(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            kind: SecurityKind::Forex,
            option: None,
        }
    }

    /// Option instrument with a synthesized OCC-style symbol. A
    /// non-positive strike is rejected here, before it can reach quoting
    /// or submission.
    pub fn option(
        underlying: impl Into<String>,
        right: OptionRight,
        strike: f64,
        expiry: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let underlying = underlying.into();
        if strike <= 0.0 {
            return Err(ValidationError::InvalidStrike(strike));
        }
        let symbol = occ_symbol(&underlying, expiry, right, strike);
        Ok(Self {
            symbol,
            kind: SecurityKind::Option,
            option: Some(OptionSpec {
                underlying,
                right,
                strike,
                expiry,
            }),
        })
    }

    /// Option instrument keyed by the platform's own full symbol (used
    /// when deserializing positions, where the platform symbol is
    /// authoritative).
    pub fn option_with_symbol(
        symbol: impl Into<String>,
        spec: OptionSpec,
    ) -> Result<Self, ValidationError> {
        if spec.strike <= 0.0 {
            return Err(ValidationError::InvalidStrike(spec.strike));
        }
        Ok(Self {
            symbol: symbol.into(),
            kind: SecurityKind::Option,
            option: Some(spec),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn kind(&self) -> SecurityKind {
        self.kind
    }

    pub fn option_spec(&self) -> Option<&OptionSpec> {
        self.option.as_ref()
    }

    /// Human-readable description, e.g. "NBIS 150 call exp 10/17/25".
    pub fn description(&self) -> String {
        match &self.option {
            Some(o) => format!(
                "{} {} {} exp {}",
                o.underlying,
                crate::utils::trim_trailing_zeros(o.strike),
                match o.right {
                    OptionRight::Call => "call",
                    OptionRight::Put => "put",
                },
                o.expiry.format("%m/%d/%y")
            ),
            None => self.symbol.clone(),
        }
    }
}

/// Broker-reported open position. Read-only snapshot: quantity is signed
/// (long positive, short negative), basis is the per-unit average cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub instrument: Instrument,
    pub quantity: f64,
    pub avg_cost: f64,
    pub opened: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuoteSource {
    LiveMarket,
    ComputedIntrinsic,
    StaleFallback,
}

/// Best-effort price for one instrument. `price == None` means the quote
/// is unavailable; callers render that as "N/A", never as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub price: Option<f64>,
    pub source: QuoteSource,
    pub at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn live(price: f64) -> Self {
        Self {
            price: Some(price),
            source: QuoteSource::LiveMarket,
            at: Utc::now(),
        }
    }

    pub fn intrinsic(price: f64) -> Self {
        Self {
            price: Some(price),
            source: QuoteSource::ComputedIntrinsic,
            at: Utc::now(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            price: None,
            source: QuoteSource::StaleFallback,
            at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.price.is_some()
    }
}

/// A position joined with its quote. Rebuilt from scratch every valuation
/// cycle; `unrealized_pl`/`market_value` are `None` when the quote is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuedPosition {
    pub position: Position,
    pub quote: PriceQuote,
    pub market_value: Option<f64>,
    pub unrealized_pl: Option<f64>,
}

/// Strategy account figures passed through unmodified from the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub equity: f64,
    pub cash: f64,
    pub buying_power: f64,
    pub model_account_value: f64,
    pub starting_cash: f64,
    pub margin_used: f64,
    pub num_trades: u32,
    pub num_winners: u32,
    pub num_losers: u32,
    pub percent_win_trades: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Sum of unrealized P/L over positions with an available quote.
    pub open_pl: f64,
    /// Positions left out of `open_pl` because no price could be resolved.
    pub unpriced_positions: usize,
    pub account: AccountSnapshot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeInForce {
    Day,
    GoodTillCancel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Working,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        self != OrderStatus::Working
    }
}

/// A trade signal ready for submission. Values are immutable once built by
/// `SignalBuilder`; bracket children are separate signals constructed only
/// after the parent's platform id is known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub action: TradeAction,
    pub instrument: Instrument,
    pub quantity: u32,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub tif: TimeInForce,
    /// Working order this signal retires (cancel-replace).
    pub cancel_replace: Option<i64>,
    /// Parent signal id for conditional child orders.
    pub parent_signal: Option<i64>,
}

/// Platform acknowledgement of a submitted signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalReceipt {
    pub signal_id: i64,
}

/// An order the platform reports as submitted. Terminal statuses drop it
/// from the working set on the next refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingOrder {
    pub signal_id: i64,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub status: OrderStatus,
    pub posted: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn option_constructor_rejects_non_positive_strike() {
        let e = Instrument::option("NBIS", OptionRight::Call, 0.0, d(2025, 10, 24));
        assert!(matches!(e, Err(ValidationError::InvalidStrike(_))));
        let e = Instrument::option("NBIS", OptionRight::Call, -5.0, d(2025, 10, 24));
        assert!(matches!(e, Err(ValidationError::InvalidStrike(_))));
    }

    #[test]
    fn option_symbol_is_occ_style() {
        let i = Instrument::option("NBIS", OptionRight::Call, 150.0, d(2025, 10, 24)).unwrap();
        assert_eq!(i.symbol(), "NBIS251024C00150000");
        assert_eq!(i.kind(), SecurityKind::Option);
        assert!(i.option_spec().is_some());
    }

    #[test]
    fn equity_has_no_option_fields() {
        let i = Instrument::equity("AAPL");
        assert_eq!(i.kind(), SecurityKind::Equity);
        assert!(i.option_spec().is_none());
        assert_eq!(i.description(), "AAPL");
    }

    #[test]
    fn option_description_matches_platform_style() {
        let i = Instrument::option("ARM", OptionRight::Call, 190.0, d(2025, 10, 24)).unwrap();
        assert_eq!(i.description(), "ARM 190 call exp 10/24/25");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Working.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }
}
