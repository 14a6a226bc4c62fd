//! Build validated trade signals from operator intents.
//!
//! Every field-combination rule is enforced here, before anything touches
//! the network. A plain intent stages one signal; a bracket intent stages
//! the primary plus child leg specs. The children only become `Signal`
//! values once the primary's platform-assigned id is known
//! (`OrderPlan::link_children`), so the staged → submitted → linked
//! progression is explicit and no signal is mutated after construction.

use chrono::{Local, NaiveDate};

use crate::error::ValidationError;
use crate::types::{
    Instrument, OptionRight, OrderStatus, OrderType, Signal, TimeInForce, TradeAction,
    WorkingOrder,
};
use crate::utils::sanitize_symbol;

/// Option half of an intent. Expiry is already a calendar date; parsing
/// the operator's spelling happens at the CLI edge.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionIntent {
    pub right: OptionRight,
    pub strike: f64,
    pub expiry: NaiveDate,
}

/// Raw trade intent as the operator expressed it, before validation.
#[derive(Debug, Clone)]
pub struct SignalIntent {
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub tif: TimeInForce,
    pub option: Option<OptionIntent>,
    pub stop_loss: Option<f64>,
    pub profit_target: Option<f64>,
    pub cancel_replace: Option<i64>,
    pub parent_signal: Option<i64>,
}

impl SignalIntent {
    /// A bare market/limit/stop intent; callers fill in the extras.
    pub fn new(symbol: &str, action: TradeAction, quantity: u32, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.to_string(),
            action,
            quantity,
            order_type,
            limit_price: None,
            stop_price: None,
            tif: TimeInForce::Day,
            option: None,
            stop_loss: None,
            profit_target: None,
            cancel_replace: None,
            parent_signal: None,
        }
    }

    fn has_bracket(&self) -> bool {
        self.stop_loss.is_some() || self.profit_target.is_some()
    }
}

/// One staged bracket leg. Becomes a `Signal` when the parent id arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildLeg {
    pub action: TradeAction,
    pub order_type: OrderType,
    pub price: f64,
}

/// A validated, staged submission: the primary signal plus any bracket
/// legs waiting for the primary's id.
#[derive(Debug, Clone)]
pub struct OrderPlan {
    pub primary: Signal,
    pub stop_loss: Option<ChildLeg>,
    pub profit_target: Option<ChildLeg>,
}

impl OrderPlan {
    pub fn signal_count(&self) -> usize {
        1 + self.stop_loss.iter().count() + self.profit_target.iter().count()
    }

    /// Construct the child signals for an accepted primary. This is the
    /// staged → linked transition: children exist only from here on, and
    /// each carries the platform-assigned parent id from birth.
    pub fn link_children(&self, parent_id: i64) -> Vec<Signal> {
        let mut out = Vec::new();
        for leg in [&self.stop_loss, &self.profit_target].into_iter().flatten() {
            let (limit_price, stop_price) = match leg.order_type {
                OrderType::Stop => (None, Some(leg.price)),
                _ => (Some(leg.price), None),
            };
            out.push(Signal {
                action: leg.action,
                instrument: self.primary.instrument.clone(),
                quantity: self.primary.quantity,
                order_type: leg.order_type,
                limit_price,
                stop_price,
                tif: self.primary.tif,
                cancel_replace: None,
                parent_signal: Some(parent_id),
            });
        }
        out
    }
}

pub struct SignalBuilder;

impl SignalBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Validate an intent against the known working-order set and stage
    /// it. Pure: no network, no clock beyond "today" for expiry checks.
    pub fn build(
        &self,
        intent: &SignalIntent,
        working: &[WorkingOrder],
    ) -> Result<OrderPlan, ValidationError> {
        self.build_at(intent, working, Local::now().date_naive())
    }

    fn build_at(
        &self,
        intent: &SignalIntent,
        working: &[WorkingOrder],
        today: NaiveDate,
    ) -> Result<OrderPlan, ValidationError> {
        if intent.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        check_price_fields(intent)?;

        let instrument = match &intent.option {
            Some(o) => {
                if o.strike <= 0.0 {
                    return Err(ValidationError::InvalidStrike(o.strike));
                }
                if o.expiry < today {
                    return Err(ValidationError::ExpiredOption(o.expiry));
                }
                Instrument::option(sanitize_symbol(&intent.symbol), o.right, o.strike, o.expiry)?
            }
            None => Instrument::equity(sanitize_symbol(&intent.symbol)),
        };

        let (stop_loss, profit_target) = check_bracket(intent)?;

        if let Some(target) = intent.cancel_replace {
            let live = working
                .iter()
                .any(|w| w.signal_id == target && w.status == OrderStatus::Working);
            if !live {
                return Err(ValidationError::StaleReplaceTarget(target));
            }
        }

        let primary = Signal {
            action: intent.action,
            instrument,
            quantity: intent.quantity,
            order_type: intent.order_type,
            limit_price: intent.limit_price,
            stop_price: intent.stop_price,
            tif: intent.tif,
            cancel_replace: intent.cancel_replace,
            parent_signal: intent.parent_signal,
        };

        Ok(OrderPlan {
            primary,
            stop_loss,
            profit_target,
        })
    }
}

fn check_price_fields(intent: &SignalIntent) -> Result<(), ValidationError> {
    match intent.order_type {
        OrderType::Market => {
            if intent.limit_price.is_some() {
                return Err(ValidationError::ConflictingPrice {
                    given: "limit",
                    order_type: "market",
                });
            }
            if intent.stop_price.is_some() {
                return Err(ValidationError::ConflictingPrice {
                    given: "stop",
                    order_type: "market",
                });
            }
        }
        OrderType::Limit => {
            let px = intent.limit_price.ok_or(ValidationError::MissingLimitPrice)?;
            if px <= 0.0 {
                return Err(ValidationError::NonPositivePrice(px));
            }
            if intent.stop_price.is_some() {
                return Err(ValidationError::ConflictingPrice {
                    given: "stop",
                    order_type: "limit",
                });
            }
        }
        OrderType::Stop => {
            let px = intent.stop_price.ok_or(ValidationError::MissingStopPrice)?;
            if px <= 0.0 {
                return Err(ValidationError::NonPositivePrice(px));
            }
            if intent.limit_price.is_some() {
                return Err(ValidationError::ConflictingPrice {
                    given: "limit",
                    order_type: "stop",
                });
            }
        }
    }
    Ok(())
}

/// Validate bracket legs and derive the closing-side child specs:
/// the stop-loss exits via a stop order, the profit-target via a limit
/// order, both on the opposite side of the entry.
fn check_bracket(
    intent: &SignalIntent,
) -> Result<(Option<ChildLeg>, Option<ChildLeg>), ValidationError> {
    if !intent.has_bracket() {
        return Ok((None, None));
    }
    // Brackets only make sense on a fresh opening order.
    if intent.cancel_replace.is_some() || intent.parent_signal.is_some() {
        return Err(ValidationError::BracketOnNonOpening);
    }
    for px in [intent.stop_loss, intent.profit_target].into_iter().flatten() {
        if px <= 0.0 {
            return Err(ValidationError::NonPositivePrice(px));
        }
    }

    // Entry reference: the limit or stop price when there is one. A pure
    // market entry has no local reference, so only the legs' relative
    // ordering can be checked.
    let entry = intent.limit_price.or(intent.stop_price);
    let long = intent.action == TradeAction::Buy;

    if let Some(entry) = entry {
        if let Some(sl) = intent.stop_loss {
            let ok = if long { sl < entry } else { sl > entry };
            if !ok {
                return Err(ValidationError::InvertedBracket(format!(
                    "stop-loss {sl} is on the wrong side of the {} entry {entry}",
                    if long { "buy" } else { "sell" }
                )));
            }
        }
        if let Some(pt) = intent.profit_target {
            let ok = if long { pt > entry } else { pt < entry };
            if !ok {
                return Err(ValidationError::InvertedBracket(format!(
                    "profit-target {pt} is on the wrong side of the {} entry {entry}",
                    if long { "buy" } else { "sell" }
                )));
            }
        }
    } else if let (Some(sl), Some(pt)) = (intent.stop_loss, intent.profit_target) {
        let ok = if long { sl < pt } else { sl > pt };
        if !ok {
            return Err(ValidationError::InvertedBracket(format!(
                "stop-loss {sl} and profit-target {pt} are inverted for a {}",
                if long { "buy" } else { "sell" }
            )));
        }
    }

    let exit = intent.action.opposite();
    let stop_loss = intent.stop_loss.map(|price| ChildLeg {
        action: exit,
        order_type: OrderType::Stop,
        price,
    });
    let profit_target = intent.profit_target.map(|price| ChildLeg {
        action: exit,
        order_type: OrderType::Limit,
        price,
    });
    Ok((stop_loss, profit_target))
}

impl Default for SignalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2025, 10, 6)
    }

    fn build(intent: &SignalIntent) -> Result<OrderPlan, ValidationError> {
        SignalBuilder::new().build_at(intent, &[], today())
    }

    fn build_with(
        intent: &SignalIntent,
        working: &[WorkingOrder],
    ) -> Result<OrderPlan, ValidationError> {
        SignalBuilder::new().build_at(intent, working, today())
    }

    fn working_order(signal_id: i64, status: OrderStatus) -> WorkingOrder {
        WorkingOrder {
            signal_id,
            symbol: "TSLA".into(),
            action: TradeAction::Sell,
            quantity: 5,
            order_type: OrderType::Limit,
            limit_price: Some(250.0),
            stop_price: None,
            status,
            posted: None,
        }
    }

    fn limit(symbol: &str, action: TradeAction, qty: u32, px: f64) -> SignalIntent {
        let mut i = SignalIntent::new(symbol, action, qty, OrderType::Limit);
        i.limit_price = Some(px);
        i
    }

    // ---------- Price field combinations ----------

    #[test]
    fn market_order_needs_no_price_fields() {
        let i = SignalIntent::new("AAPL", TradeAction::Buy, 10, OrderType::Market);
        let plan = build(&i).unwrap();
        assert_eq!(plan.signal_count(), 1);
        assert_eq!(plan.primary.order_type, OrderType::Market);
        assert_eq!(plan.primary.limit_price, None);
        assert_eq!(plan.primary.stop_price, None);
        assert_eq!(plan.primary.instrument.symbol(), "AAPL");
    }

    #[test]
    fn limit_without_price_rejected() {
        let i = SignalIntent::new("AAPL", TradeAction::Buy, 10, OrderType::Limit);
        assert_eq!(build(&i).unwrap_err(), ValidationError::MissingLimitPrice);
    }

    #[test]
    fn stop_without_price_rejected() {
        let i = SignalIntent::new("AAPL", TradeAction::Sell, 10, OrderType::Stop);
        assert_eq!(build(&i).unwrap_err(), ValidationError::MissingStopPrice);
    }

    #[test]
    fn market_with_limit_price_rejected() {
        let mut i = SignalIntent::new("AAPL", TradeAction::Buy, 10, OrderType::Market);
        i.limit_price = Some(150.0);
        assert!(matches!(
            build(&i).unwrap_err(),
            ValidationError::ConflictingPrice { given: "limit", .. }
        ));
    }

    #[test]
    fn limit_with_stop_price_rejected() {
        let mut i = limit("AAPL", TradeAction::Buy, 10, 150.0);
        i.stop_price = Some(140.0);
        assert!(matches!(
            build(&i).unwrap_err(),
            ValidationError::ConflictingPrice { given: "stop", .. }
        ));
    }

    #[test]
    fn non_positive_prices_rejected() {
        let i = limit("AAPL", TradeAction::Buy, 10, 0.0);
        assert_eq!(build(&i).unwrap_err(), ValidationError::NonPositivePrice(0.0));

        let mut i = SignalIntent::new("AAPL", TradeAction::Sell, 10, OrderType::Stop);
        i.stop_price = Some(-1.0);
        assert_eq!(build(&i).unwrap_err(), ValidationError::NonPositivePrice(-1.0));
    }

    #[test]
    fn zero_quantity_rejected() {
        let i = SignalIntent::new("AAPL", TradeAction::Buy, 0, OrderType::Market);
        assert_eq!(build(&i).unwrap_err(), ValidationError::ZeroQuantity);
    }

    #[test]
    fn symbol_is_sanitized() {
        let i = SignalIntent::new("  aapl ", TradeAction::Buy, 1, OrderType::Market);
        let plan = build(&i).unwrap();
        assert_eq!(plan.primary.instrument.symbol(), "AAPL");
    }

    // ---------- Options ----------

    fn option_intent(strike: f64, expiry: NaiveDate) -> SignalIntent {
        let mut i = limit("NBIS", TradeAction::Buy, 5, 2.0);
        i.option = Some(OptionIntent {
            right: OptionRight::Call,
            strike,
            expiry,
        });
        i
    }

    #[test]
    fn option_accepted_with_future_expiry() {
        let plan = build(&option_intent(150.0, d(2025, 10, 24))).unwrap();
        let spec = plan.primary.instrument.option_spec().unwrap();
        assert_eq!(spec.strike, 150.0);
        assert_eq!(spec.expiry, d(2025, 10, 24));
    }

    #[test]
    fn option_expiring_today_accepted() {
        assert!(build(&option_intent(150.0, today())).is_ok());
    }

    #[test]
    fn option_with_past_expiry_rejected() {
        assert_eq!(
            build(&option_intent(150.0, d(2025, 10, 3))).unwrap_err(),
            ValidationError::ExpiredOption(d(2025, 10, 3))
        );
    }

    #[test]
    fn option_with_non_positive_strike_rejected() {
        assert_eq!(
            build(&option_intent(0.0, d(2025, 10, 24))).unwrap_err(),
            ValidationError::InvalidStrike(0.0)
        );
        assert_eq!(
            build(&option_intent(-150.0, d(2025, 10, 24))).unwrap_err(),
            ValidationError::InvalidStrike(-150.0)
        );
    }

    // ---------- Brackets ----------

    fn bracket_buy() -> SignalIntent {
        let mut i = limit("TSLA", TradeAction::Buy, 5, 250.0);
        i.stop_loss = Some(245.0);
        i.profit_target = Some(260.0);
        i
    }

    #[test]
    fn bracket_buy_stages_three_signals() {
        let plan = build(&bracket_buy()).unwrap();
        assert_eq!(plan.signal_count(), 3);

        let sl = plan.stop_loss.as_ref().unwrap();
        assert_eq!(sl.action, TradeAction::Sell);
        assert_eq!(sl.order_type, OrderType::Stop);
        assert_eq!(sl.price, 245.0);

        let pt = plan.profit_target.as_ref().unwrap();
        assert_eq!(pt.action, TradeAction::Sell);
        assert_eq!(pt.order_type, OrderType::Limit);
        assert_eq!(pt.price, 260.0);
    }

    #[test]
    fn children_carry_parent_id_only_after_linking() {
        let plan = build(&bracket_buy()).unwrap();
        // Staged legs are not signals yet; linking mints them with the
        // platform-assigned parent id.
        let children = plan.link_children(144260505);
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.parent_signal, Some(144260505));
            assert_eq!(child.action, TradeAction::Sell);
            assert_eq!(child.quantity, 5);
            assert_eq!(child.instrument, plan.primary.instrument);
        }
        assert_eq!(children[0].stop_price, Some(245.0));
        assert_eq!(children[0].limit_price, None);
        assert_eq!(children[1].limit_price, Some(260.0));
        assert_eq!(children[1].stop_price, None);
        // The primary itself never carries a parent.
        assert_eq!(plan.primary.parent_signal, None);
    }

    #[test]
    fn inverted_buy_bracket_rejected() {
        let mut i = bracket_buy();
        i.stop_loss = Some(255.0); // above the entry on a long
        assert!(matches!(
            build(&i).unwrap_err(),
            ValidationError::InvertedBracket(_)
        ));

        let mut i = bracket_buy();
        i.profit_target = Some(240.0); // below the entry on a long
        assert!(matches!(
            build(&i).unwrap_err(),
            ValidationError::InvertedBracket(_)
        ));
    }

    #[test]
    fn sell_bracket_sides_are_mirrored() {
        // Short entry at 250: stop-loss above, profit-target below.
        let mut i = limit("TSLA", TradeAction::Sell, 5, 250.0);
        i.stop_loss = Some(255.0);
        i.profit_target = Some(240.0);
        let plan = build(&i).unwrap();
        assert_eq!(plan.stop_loss.as_ref().unwrap().action, TradeAction::Buy);
        assert_eq!(plan.profit_target.as_ref().unwrap().action, TradeAction::Buy);

        // Inverted for a short.
        let mut i = limit("TSLA", TradeAction::Sell, 5, 250.0);
        i.stop_loss = Some(245.0);
        assert!(matches!(
            build(&i).unwrap_err(),
            ValidationError::InvertedBracket(_)
        ));
    }

    #[test]
    fn market_bracket_checks_leg_ordering_only() {
        let mut i = SignalIntent::new("TSLA", TradeAction::Buy, 5, OrderType::Market);
        i.stop_loss = Some(245.0);
        i.profit_target = Some(260.0);
        assert!(build(&i).is_ok());

        i.stop_loss = Some(265.0); // above the target on a long
        assert!(matches!(
            build(&i).unwrap_err(),
            ValidationError::InvertedBracket(_)
        ));
    }

    #[test]
    fn bracket_on_cancel_replace_rejected() {
        let mut i = bracket_buy();
        i.cancel_replace = Some(1);
        assert_eq!(build(&i).unwrap_err(), ValidationError::BracketOnNonOpening);
    }

    #[test]
    fn bracket_on_child_order_rejected() {
        let mut i = bracket_buy();
        i.parent_signal = Some(99);
        assert_eq!(build(&i).unwrap_err(), ValidationError::BracketOnNonOpening);
    }

    #[test]
    fn bracket_leg_price_must_be_positive() {
        let mut i = bracket_buy();
        i.stop_loss = Some(0.0);
        assert_eq!(build(&i).unwrap_err(), ValidationError::NonPositivePrice(0.0));
    }

    // ---------- Cancel-replace ----------

    #[test]
    fn cancel_replace_against_working_order_accepted() {
        let mut i = limit("TSLA", TradeAction::Sell, 5, 248.0);
        i.cancel_replace = Some(144260505);
        let working = vec![working_order(144260505, OrderStatus::Working)];
        let plan = build_with(&i, &working).unwrap();
        assert_eq!(plan.primary.cancel_replace, Some(144260505));
    }

    #[test]
    fn cancel_replace_against_unknown_id_is_stale() {
        let mut i = limit("TSLA", TradeAction::Sell, 5, 248.0);
        i.cancel_replace = Some(777);
        assert_eq!(
            build_with(&i, &[]).unwrap_err(),
            ValidationError::StaleReplaceTarget(777)
        );
    }

    #[test]
    fn cancel_replace_against_terminal_order_is_stale() {
        let mut i = limit("TSLA", TradeAction::Sell, 5, 248.0);
        i.cancel_replace = Some(42);
        let working = vec![working_order(42, OrderStatus::Filled)];
        assert_eq!(
            build_with(&i, &working).unwrap_err(),
            ValidationError::StaleReplaceTarget(42)
        );
    }

    #[test]
    fn parent_signal_passes_through_for_conditional_orders() {
        let mut i = limit("TSLA", TradeAction::Sell, 5, 260.0);
        i.parent_signal = Some(5150);
        let plan = build(&i).unwrap();
        assert_eq!(plan.primary.parent_signal, Some(5150));
    }
}
