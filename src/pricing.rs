//! Best-effort price resolution with a defined fallback chain.
//!
//! Stocks quote directly. Options try their own quote symbol first; when
//! the venue has no data for it, the oracle falls back to intrinsic value
//! computed from the underlying. When the underlying itself cannot be
//! fetched the quote is returned as unavailable rather than an error, so
//! a dead symbol never aborts a valuation pass.

use async_trait::async_trait;
use tracing::warn;

use crate::types::{Instrument, OptionRight, OptionSpec, PriceQuote, SecurityKind};
use crate::utils::occ_symbol;

/// A venue that can resolve a last price for a quote symbol.
/// `Ok(None)` means the venue answered but has no data for the symbol;
/// errors mean the venue could not be reached at all. The oracle treats
/// both as "try the next fallback".
#[async_trait]
pub trait PriceSource {
    async fn last_price(&self, symbol: &str) -> anyhow::Result<Option<f64>>;
}

/// Intrinsic value of an option given the underlying price: what the
/// contract is worth exercised right now, ignoring time value.
pub fn intrinsic_value(underlying_price: f64, strike: f64, right: OptionRight) -> f64 {
    match right {
        OptionRight::Call => (underlying_price - strike).max(0.0),
        OptionRight::Put => (strike - underlying_price).max(0.0),
    }
}

pub struct PriceOracle<S> {
    source: S,
}

impl<S: PriceSource> PriceOracle<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve a quote. Never fails: fallbacks end in an explicit
    /// unavailable quote, which callers must render as "N/A".
    pub async fn quote(&self, instrument: &Instrument) -> PriceQuote {
        match instrument.kind() {
            SecurityKind::Option => {
                // The constructors guarantee the spec is present for options.
                match instrument.option_spec() {
                    Some(spec) => self.quote_option(spec).await,
                    None => PriceQuote::unavailable(),
                }
            }
            _ => match self.fetch(instrument.symbol()).await {
                Some(px) => PriceQuote::live(px),
                None => PriceQuote::unavailable(),
            },
        }
    }

    async fn quote_option(&self, spec: &OptionSpec) -> PriceQuote {
        let option_symbol = occ_symbol(&spec.underlying, spec.expiry, spec.right, spec.strike);
        if let Some(px) = self.fetch(&option_symbol).await {
            return PriceQuote::live(px);
        }
        // No live contract price; derive intrinsic value from the
        // underlying. Expired contracts still price this way.
        match self.fetch(&spec.underlying).await {
            Some(u) => PriceQuote::intrinsic(intrinsic_value(u, spec.strike, spec.right)),
            None => PriceQuote::unavailable(),
        }
    }

    async fn fetch(&self, symbol: &str) -> Option<f64> {
        match self.source.last_price(symbol).await {
            Ok(px) => px,
            Err(e) => {
                warn!("price fetch failed for {symbol}: {e:#}");
                None
            }
        }
    }
}
