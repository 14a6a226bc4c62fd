//! Working-order lifecycle: submission, cancel, cancel-replace, refresh.
//!
//! Per order the states are pending-submit → working → filled | cancelled
//! | rejected. Pending-submit exists only for the duration of the network
//! call: on any transport failure the order never enters the local
//! working set and the caller is told nothing was submitted. Terminal
//! orders drop out of the set on refresh.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::error::SubmissionError;
use crate::signal::OrderPlan;
use crate::types::{OrderStatus, Signal, SignalReceipt, WorkingOrder};

/// The platform endpoint that accepts signals and cancels, and reports
/// the authoritative working-order list.
#[async_trait]
pub trait SignalGateway {
    async fn submit(&self, signal: &Signal) -> Result<SignalReceipt, SubmissionError>;
    async fn cancel(&self, signal_id: i64) -> Result<(), SubmissionError>;
    async fn working_orders(&self) -> Result<Vec<WorkingOrder>, SubmissionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The order was already terminal (or never known): nothing to do.
    NothingToDo,
}

/// Everything that went live for one staged plan.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub primary: WorkingOrder,
    pub children: Vec<WorkingOrder>,
    /// The signal retired first when the plan was a cancel-replace.
    pub replaced: Option<i64>,
}

pub struct OrderLifecycleManager<G> {
    gateway: G,
    working: Vec<WorkingOrder>,
}

impl<G: SignalGateway> OrderLifecycleManager<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            working: Vec::new(),
        }
    }

    /// Local view of the working set, as of the last refresh or submit.
    pub fn working(&self) -> &[WorkingOrder] {
        &self.working
    }

    pub fn is_working(&self, signal_id: i64) -> bool {
        self.working
            .iter()
            .any(|o| o.signal_id == signal_id && o.status == OrderStatus::Working)
    }

    /// Re-synchronize against the platform's authoritative list. Orders
    /// that went terminal since the last look disappear from the set.
    pub async fn refresh(&mut self) -> Result<&[WorkingOrder], SubmissionError> {
        let orders = self.gateway.working_orders().await?;
        self.working = orders
            .into_iter()
            .filter(|o| !o.status.is_terminal())
            .collect();
        Ok(&self.working)
    }

    /// Submit one signal. On success the order is confirmed working; on
    /// any error it never entered the set and was not submitted.
    pub async fn submit(&mut self, signal: &Signal) -> Result<WorkingOrder, SubmissionError> {
        let receipt = self.gateway.submit(signal).await?;
        let order = WorkingOrder {
            signal_id: receipt.signal_id,
            symbol: signal.instrument.symbol().to_string(),
            action: signal.action,
            quantity: signal.quantity,
            order_type: signal.order_type,
            limit_price: signal.limit_price,
            stop_price: signal.stop_price,
            status: OrderStatus::Working,
            posted: Some(Utc::now()),
        };
        info!("signal {} confirmed working", order.signal_id);
        self.working.push(order.clone());
        Ok(order)
    }

    /// Drive a staged plan to completion: retire the cancel-replace
    /// target first (compensating sequence), submit the primary, then
    /// link and submit the bracket children under the primary's id.
    pub async fn submit_plan(
        &mut self,
        plan: &OrderPlan,
    ) -> Result<SubmissionReport, SubmissionError> {
        let replaced = plan.primary.cancel_replace;
        let primary = if let Some(target) = replaced {
            self.cancel_confirmed(target).await?;
            // The retirement already happened, so the replacement goes
            // out as a fresh signal without the replace linkage.
            Signal {
                cancel_replace: None,
                ..plan.primary.clone()
            }
        } else {
            plan.primary.clone()
        };

        let submitted = self.submit(&primary).await?;

        let mut children = Vec::new();
        for child in plan.link_children(submitted.signal_id) {
            match self.submit(&child).await {
                Ok(order) => children.push(order),
                Err(e) => {
                    warn!(
                        "primary signal {} is working but a bracket leg failed: {e}",
                        submitted.signal_id
                    );
                    return Err(e);
                }
            }
        }

        Ok(SubmissionReport {
            primary: submitted,
            children,
            replaced,
        })
    }

    /// Cancel a working order. Idempotent from the caller's side: an id
    /// that is not in the working set returns `NothingToDo` without a
    /// network call.
    pub async fn cancel(&mut self, signal_id: i64) -> Result<CancelOutcome, SubmissionError> {
        if !self.is_working(signal_id) {
            return Ok(CancelOutcome::NothingToDo);
        }
        self.gateway.cancel(signal_id).await?;
        self.working.retain(|o| o.signal_id != signal_id);
        Ok(CancelOutcome::Cancelled)
    }

    /// Cancel and verify against the authoritative list. The platform's
    /// replace endpoint is not documented as atomic, so the replacement
    /// must not go out while the old order could still be live.
    async fn cancel_confirmed(&mut self, target: i64) -> Result<(), SubmissionError> {
        self.gateway.cancel(target).await?;
        self.refresh().await?;
        if self.is_working(target) {
            return Err(SubmissionError::CancelUnconfirmed(target));
        }
        info!("signal {target} confirmed cancelled, submitting replacement");
        Ok(())
    }
}
