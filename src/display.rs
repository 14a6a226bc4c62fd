//! Terminal rendering for positions, summaries, orders and plans.
//!
//! Pure string builders so the layouts are testable. Unavailable prices
//! always render "N/A"; negative money renders in parentheses like the
//! platform's own statements.

use crate::c2_client::{ManagedStrategy, Profile};
use crate::orders::SubmissionReport;
use crate::session::PositionsReport;
use crate::signal::OrderPlan;
use crate::types::{
    OrderType, PortfolioSummary, QuoteSource, Signal, TradeAction, ValuedPosition, WorkingOrder,
};
use crate::utils::format_ts;

/// "$1,234" / "($1,234)" with thousands grouping, no cents (totals row).
pub fn fmt_money(v: f64) -> String {
    let rounded = v.round().abs() as i64;
    let grouped = group_thousands(rounded);
    if v < -0.5 {
        format!("(${grouped})")
    } else {
        format!("${grouped}")
    }
}

/// "$1,234.56" / "($1,234.56)" for the summary block.
pub fn fmt_money_cents(v: f64) -> String {
    let abs = v.abs();
    let whole = abs.trunc() as i64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as i64;
    // Carry when the cents round up to a dollar.
    let (whole, cents) = if cents >= 100 { (whole + 1, 0) } else { (whole, cents) };
    let grouped = group_thousands(whole);
    if v < 0.0 && (whole > 0 || cents > 0) {
        format!("(${grouped}.{cents:02})")
    } else {
        format!("${grouped}.{cents:02}")
    }
}

fn group_thousands(mut n: i64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut parts = Vec::new();
    while n > 0 {
        parts.push((n % 1000) as u16);
        n /= 1000;
    }
    let mut out = String::new();
    for (i, p) in parts.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&p.to_string());
        } else {
            out.push_str(&format!(",{p:03}"));
        }
    }
    out
}

fn price_cell(v: &ValuedPosition) -> String {
    match (v.quote.price, v.quote.source) {
        // The asterisk marks a price derived from the underlying.
        (Some(px), QuoteSource::ComputedIntrinsic) => format!("{px:.2}*"),
        (Some(px), _) => format!("{px:.2}"),
        (None, _) => "N/A".into(),
    }
}

fn pl_cell(pl: Option<f64>) -> String {
    match pl {
        Some(v) => fmt_money(v),
        None => "N/A".into(),
    }
}

pub fn positions_table(report: &PositionsReport) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(120));
    out.push_str("\nOpen Positions\n");
    out.push_str(&"=".repeat(120));
    out.push('\n');

    if report.positions.is_empty() {
        out.push_str("\nNo open positions found.\n");
        return out;
    }

    out.push_str(&format!(
        "{:<15} {:<20} {:<32} {:<6} {:>8} {:>10} {:>10} {:>16}\n",
        "Date", "Symbol", "Description", "Side", "Quant", "Basis", "Price", "Unrealized P/L"
    ));
    out.push_str(&"-".repeat(120));
    out.push('\n');

    for v in &report.positions {
        let p = &v.position;
        let date = p.opened.as_ref().map(format_ts).unwrap_or_else(|| "-".into());
        let side = if p.is_long() { "Long" } else { "Short" };
        out.push_str(&format!(
            "{:<15} {:<20} {:<32} {:<6} {:>8} {:>10.2} {:>10} {:>16}\n",
            date,
            p.instrument.symbol(),
            p.instrument.description(),
            side,
            p.quantity.abs(),
            p.avg_cost,
            price_cell(v),
            pl_cell(v.unrealized_pl),
        ));
    }

    out.push_str(&"-".repeat(120));
    out.push('\n');
    out.push_str(&format!(
        "{:<15} {:<20} {:<32} {:<6} {:>8} {:>10} {:>10} {:>16}\n",
        "TOTALS",
        "",
        "",
        "",
        "",
        "",
        "",
        fmt_money(report.summary.open_pl)
    ));
    if report.summary.unpriced_positions > 0 {
        out.push_str(&format!(
            "  ({} position(s) without an available quote are excluded from the total)\n",
            report.summary.unpriced_positions
        ));
    }
    out.push_str(
        "\nNote: * marks a value computed from the underlying price (no live option quote).\n",
    );
    out
}

pub fn portfolio_summary(summary: &PortfolioSummary) -> String {
    let a = &summary.account;
    let total_pl = a.model_account_value - a.starting_cash;
    let total_pl_pct = if a.starting_cash > 0.0 {
        total_pl / a.starting_cash * 100.0
    } else {
        0.0
    };

    let mut out = String::new();
    out.push_str("PORTFOLIO SUMMARY\n");
    out.push_str(&"=".repeat(120));
    out.push('\n');
    out.push_str(&format!(
        "  Starting Capital:          {:>18}\n",
        fmt_money_cents(a.starting_cash)
    ));
    out.push_str(&format!(
        "  Current Account Value:     {:>18}\n",
        fmt_money_cents(a.model_account_value)
    ));
    out.push_str(&format!(
        "  Available Cash:            {:>18}\n",
        fmt_money_cents(a.cash)
    ));
    out.push_str(&format!(
        "  Open Positions Value:      {:>18}\n",
        fmt_money_cents(a.equity)
    ));
    out.push_str(&format!(
        "  Buying Power:              {:>18}\n",
        fmt_money_cents(a.buying_power)
    ));
    out.push_str(&format!(
        "  Margin Used:               {:>18}\n",
        fmt_money_cents(a.margin_used)
    ));
    out.push_str(&format!(
        "\n  Total Open P/L:            {:>18}  ({total_pl_pct:>6.2}%)\n",
        fmt_money_cents(total_pl)
    ));
    out.push_str(&format!("\n  Total Trades:              {:>18}\n", a.num_trades));
    out.push_str(&format!(
        "  Winners / Losers:          {:>11} / {:<4}  ({:.1}% win rate)\n",
        a.num_winners, a.num_losers, a.percent_win_trades
    ));
    out
}

pub fn order_line(order: &WorkingOrder, index: usize) -> String {
    let price = match (order.order_type, order.limit_price, order.stop_price) {
        (OrderType::Limit, Some(px), _) => format!("${px:>8.2} Limit"),
        (OrderType::Stop, _, Some(px)) => format!("${px:>8.2} Stop"),
        (OrderType::Market, _, _) => "Market".to_string(),
        _ => "-".to_string(),
    };
    let side = match order.action {
        TradeAction::Buy => "BUY",
        TradeAction::Sell => "SELL",
    };
    let posted = order.posted.as_ref().map(format_ts).unwrap_or_else(|| "-".into());
    format!(
        "  {index:>2}. Signal {:>10}  |  {:>18}  |  {side:>4} {:>5} @ {price:<15}  |  {:?}  |  {posted}",
        order.signal_id, order.symbol, order.quantity, order.status
    )
}

pub fn orders_table(orders: &[WorkingOrder]) -> String {
    if orders.is_empty() {
        return "No working orders.\n".into();
    }
    let mut out = format!("WORKING ORDERS ({} total)\n", orders.len());
    out.push_str(&"-".repeat(100));
    out.push('\n');
    for (i, order) in orders.iter().enumerate() {
        out.push_str(&order_line(order, i + 1));
        out.push('\n');
    }
    out
}

fn signal_line(signal: &Signal) -> String {
    let side = match signal.action {
        TradeAction::Buy => "BUY",
        TradeAction::Sell => "SELL",
    };
    let price = match signal.order_type {
        OrderType::Market => "at market".to_string(),
        OrderType::Limit => format!("limit {}", signal.limit_price.unwrap_or(0.0)),
        OrderType::Stop => format!("stop {}", signal.stop_price.unwrap_or(0.0)),
    };
    format!(
        "{side} {} x {} {price}",
        signal.quantity,
        signal.instrument.description()
    )
}

/// Preview shown before the confirmation prompt.
pub fn plan_preview(plan: &OrderPlan) -> String {
    let mut out = String::from("ORDER PREVIEW\n");
    out.push_str(&"=".repeat(80));
    out.push('\n');
    out.push_str(&format!("  Primary:        {}\n", signal_line(&plan.primary)));
    if let Some(id) = plan.primary.cancel_replace {
        out.push_str(&format!("  Replaces:       signal {id} (cancel first, then submit)\n"));
    }
    if let Some(id) = plan.primary.parent_signal {
        out.push_str(&format!("  Parent signal:  {id}\n"));
    }
    if let Some(leg) = &plan.stop_loss {
        out.push_str(&format!(
            "  Stop loss:      {:?} stop @ {} (child, linked after acceptance)\n",
            leg.action, leg.price
        ));
    }
    if let Some(leg) = &plan.profit_target {
        out.push_str(&format!(
            "  Profit target:  {:?} limit @ {} (child, linked after acceptance)\n",
            leg.action, leg.price
        ));
    }
    out.push_str(&format!("  Signals staged: {}\n", plan.signal_count()));
    out.push_str(&"=".repeat(80));
    out.push('\n');
    out
}

pub fn submission_report(report: &SubmissionReport) -> String {
    let mut out = String::from("SIGNAL SUBMITTED\n");
    if let Some(id) = report.replaced {
        out.push_str(&format!("  Replaced signal:   {id}\n"));
    }
    out.push_str(&format!("  Signal ID:         {}\n", report.primary.signal_id));
    for child in &report.children {
        let label = match child.order_type {
            OrderType::Stop => "Stop Loss Signal",
            _ => "Profit Target Signal",
        };
        out.push_str(&format!("  {label}:  {}\n", child.signal_id));
    }
    out
}

pub fn discovery(profile: &Profile, strategies: &[ManagedStrategy]) -> String {
    let mut out = String::from("PROFILE\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');
    out.push_str(&format!(
        "  Person ID:   {}\n",
        profile.person_id.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
    ));
    out.push_str(&format!("  Alias:       {}\n", profile.alias.as_deref().unwrap_or("-")));
    out.push_str(&format!("  Email:       {}\n", profile.email.as_deref().unwrap_or("-")));
    out.push_str(&format!("  Manager:     {}\n", profile.is_manager));
    out.push_str(&format!("  Investor:    {}\n", profile.is_investor));
    out.push_str("\nMANAGED STRATEGIES\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');
    if strategies.is_empty() {
        out.push_str("  (none found)\n");
    }
    for s in strategies {
        let alive = match s.is_alive {
            Some(true) => " (alive)",
            Some(false) => " (inactive)",
            None => "",
        };
        out.push_str(&format!("  - {} (ID: {}){alive}\n", s.name, s.strategy_id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountSnapshot, Instrument, Position, PriceQuote};

    #[test]
    fn money_formats() {
        assert_eq!(fmt_money(21.0), "$21");
        assert_eq!(fmt_money(-21.42), "($21)");
        assert_eq!(fmt_money(1234567.0), "$1,234,567");
        assert_eq!(fmt_money(0.0), "$0");
        assert_eq!(fmt_money_cents(42000.5), "$42,000.50");
        assert_eq!(fmt_money_cents(-21.42), "($21.42)");
        assert_eq!(fmt_money_cents(0.0), "$0.00");
        assert_eq!(fmt_money_cents(-0.999), "($1.00)");
    }

    fn valued(quote: PriceQuote, pl: Option<f64>) -> ValuedPosition {
        ValuedPosition {
            position: Position {
                instrument: Instrument::equity("AAPL"),
                quantity: 10.0,
                avg_cost: 180.0,
                opened: None,
            },
            market_value: quote.price.map(|px| px * 10.0),
            quote,
            unrealized_pl: pl,
        }
    }

    fn report(positions: Vec<ValuedPosition>, unpriced: usize, open_pl: f64) -> PositionsReport {
        PositionsReport {
            positions,
            summary: PortfolioSummary {
                open_pl,
                unpriced_positions: unpriced,
                account: AccountSnapshot::default(),
            },
        }
    }

    #[test]
    fn unavailable_price_renders_na_not_zero() {
        let r = report(vec![valued(PriceQuote::unavailable(), None)], 1, 0.0);
        let table = positions_table(&r);
        assert!(table.contains("N/A"));
        assert!(!table.contains("$0.00"));
        assert!(table.contains("1 position(s) without an available quote"));
    }

    #[test]
    fn intrinsic_price_is_marked() {
        let r = report(vec![valued(PriceQuote::intrinsic(0.05), Some(-21.42))], 0, -21.42);
        let table = positions_table(&r);
        assert!(table.contains("0.05*"));
        assert!(table.contains("($21)"));
    }

    #[test]
    fn live_price_is_unmarked() {
        let r = report(vec![valued(PriceQuote::live(190.0), Some(100.0))], 0, 100.0);
        let table = positions_table(&r);
        assert!(table.contains("190.00"));
        assert!(!table.contains("190.00*"));
    }

    #[test]
    fn empty_report_says_so() {
        let table = positions_table(&report(vec![], 0, 0.0));
        assert!(table.contains("No open positions found."));
    }
}
