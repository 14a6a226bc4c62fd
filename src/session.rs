//! One trading session for one strategy.
//!
//! The session is an explicit value wiring the account source, price
//! oracle, signal builder and order manager together; every operation
//! goes through it rather than through process-wide state, so a second
//! strategy would just be a second session.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::SubmissionError;
use crate::orders::{CancelOutcome, OrderLifecycleManager, SignalGateway, SubmissionReport};
use crate::pricing::{PriceOracle, PriceSource};
use crate::signal::{OrderPlan, SignalBuilder, SignalIntent};
use crate::types::{AccountSnapshot, PortfolioSummary, Position, ValuedPosition, WorkingOrder};
use crate::valuation::PositionValuator;

/// Read-only view of the strategy account on the platform.
#[async_trait]
pub trait AccountSource {
    async fn open_positions(&self, security_type: Option<&str>) -> Result<Vec<Position>>;
    async fn account_snapshot(&self) -> Result<AccountSnapshot>;
}

/// One valuation pass over the account, ready for rendering or `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct PositionsReport {
    pub positions: Vec<ValuedPosition>,
    pub summary: PortfolioSummary,
}

pub struct TradingSession<A, P, G> {
    strategy_id: i64,
    account: A,
    oracle: PriceOracle<P>,
    builder: SignalBuilder,
    orders: OrderLifecycleManager<G>,
}

impl<A, P, G> TradingSession<A, P, G>
where
    A: AccountSource,
    P: PriceSource,
    G: SignalGateway,
{
    pub fn new(strategy_id: i64, account: A, oracle: PriceOracle<P>, gateway: G) -> Self {
        Self {
            strategy_id,
            account,
            oracle,
            builder: SignalBuilder::new(),
            orders: OrderLifecycleManager::new(gateway),
        }
    }

    pub fn strategy_id(&self) -> i64 {
        self.strategy_id
    }

    /// Fresh snapshot, fresh quotes, fresh report. Nothing is cached
    /// between calls. A failing details endpoint degrades to zeroed
    /// account figures rather than losing the position listing.
    pub async fn positions_report(&self, security_type: Option<&str>) -> Result<PositionsReport> {
        let positions = self.account.open_positions(security_type).await?;
        let snapshot = match self.account.account_snapshot().await {
            Ok(s) => s,
            Err(e) => {
                warn!("could not fetch account details: {e:#}");
                AccountSnapshot::default()
            }
        };
        let valuator = PositionValuator::new(&self.oracle);
        let (valued, summary) = valuator.valuate(&positions, &snapshot).await;
        Ok(PositionsReport {
            positions: valued,
            summary,
        })
    }

    /// Validate an intent against the current local working-order view
    /// and stage it. Purely local: callers wanting the freshest view for
    /// a cancel-replace should `refresh_orders` first.
    pub fn stage(&self, intent: &SignalIntent) -> Result<OrderPlan, crate::error::ValidationError> {
        self.builder.build(intent, self.orders.working())
    }

    pub async fn submit_plan(
        &mut self,
        plan: &OrderPlan,
    ) -> Result<SubmissionReport, SubmissionError> {
        self.orders.submit_plan(plan).await
    }

    pub async fn refresh_orders(&mut self) -> Result<&[WorkingOrder], SubmissionError> {
        self.orders.refresh().await
    }

    pub async fn cancel_order(&mut self, signal_id: i64) -> Result<CancelOutcome, SubmissionError> {
        self.orders.cancel(signal_id).await
    }
}
