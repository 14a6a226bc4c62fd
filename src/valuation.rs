//! Position valuation: join broker positions with oracle quotes.
//!
//! Unrealized P/L is (price − basis) × signed quantity, so long and short
//! positions use the same expression. A position without a resolvable
//! price is reported with its P/L unavailable and left out of the
//! aggregate total, with the omission counted so the total is never
//! silently wrong.

use crate::pricing::{PriceOracle, PriceSource};
use crate::types::{AccountSnapshot, PortfolioSummary, Position, ValuedPosition};

pub struct PositionValuator<'a, S> {
    oracle: &'a PriceOracle<S>,
}

impl<'a, S: PriceSource> PositionValuator<'a, S> {
    pub fn new(oracle: &'a PriceOracle<S>) -> Self {
        Self { oracle }
    }

    /// Value every position independently, preserving input order so the
    /// table stays stable across monitor refreshes.
    pub async fn valuate(
        &self,
        positions: &[Position],
        snapshot: &AccountSnapshot,
    ) -> (Vec<ValuedPosition>, PortfolioSummary) {
        let mut valued = Vec::with_capacity(positions.len());
        let mut open_pl = 0.0;
        let mut unpriced = 0usize;

        for position in positions {
            let quote = self.oracle.quote(&position.instrument).await;
            if !quote.is_available() {
                unpriced += 1;
            }
            let (market_value, unrealized_pl) = match quote.price {
                Some(px) => (
                    Some(px * position.quantity.abs()),
                    Some((px - position.avg_cost) * position.quantity),
                ),
                None => (None, None),
            };
            if let Some(pl) = unrealized_pl {
                open_pl += pl;
            }
            valued.push(ValuedPosition {
                position: position.clone(),
                quote,
                market_value,
                unrealized_pl,
            });
        }

        let summary = PortfolioSummary {
            open_pl,
            unpriced_positions: unpriced,
            account: snapshot.clone(),
        };
        (valued, summary)
    }
}
