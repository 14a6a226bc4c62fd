//! Interactive menu, guided prompts and the live monitor loop.
//!
//! All stdin reads happen on a blocking thread so the runtime stays free
//! to service timers and Ctrl-C. The monitor's in-flight fetch is
//! dropped, not awaited, when the operator interrupts.

use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Local;
use tracing::error;

use crate::display;
use crate::orders::{CancelOutcome, SignalGateway};
use crate::pricing::PriceSource;
use crate::session::{AccountSource, TradingSession};
use crate::signal::{OptionIntent, SignalIntent};
use crate::types::{OptionRight, OrderType, TimeInForce, TradeAction};
use crate::utils::{friday_after_next, next_friday, parse_expiry};

/// Read one trimmed line from stdin on a blocking thread.
async fn prompt(message: &str) -> Result<String> {
    use std::io::{self, Write};
    let message = message.to_string();
    let line = tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{message}");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_string())
    })
    .await
    .map_err(|e| anyhow!("stdin read task failed: {e}"))??;
    Ok(line)
}

async fn prompt_required(message: &str) -> Result<String> {
    loop {
        let v = prompt(message).await?;
        if !v.is_empty() {
            return Ok(v);
        }
        println!("  This field is required.");
    }
}

async fn prompt_parse<T: std::str::FromStr>(message: &str) -> Result<T> {
    loop {
        let v = prompt_required(message).await?;
        match v.trim_start_matches('$').parse() {
            Ok(parsed) => return Ok(parsed),
            Err(_) => println!("  Please enter a valid number."),
        }
    }
}

/// Numbered choice; empty input takes the default (1-based).
async fn choose(title: &str, options: &[&str], default: usize) -> Result<usize> {
    println!("\n{title}");
    for (i, opt) in options.iter().enumerate() {
        let marker = if i + 1 == default { "→" } else { " " };
        println!("  {marker} {}. {opt}", i + 1);
    }
    loop {
        let raw = prompt(&format!("Enter choice [1-{}] (default {default}): ", options.len()))
            .await?;
        if raw.is_empty() {
            return Ok(default);
        }
        match raw.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(n),
            _ => println!("  Please enter a number between 1 and {}.", options.len()),
        }
    }
}

async fn confirm(message: &str) -> Result<bool> {
    loop {
        let v = prompt(&format!("{message} [y/n]: ")).await?.to_lowercase();
        match v.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("  Please answer 'y' or 'n'."),
        }
    }
}

fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}

fn header(strategy_id: i64) {
    println!("{}", "=".repeat(100));
    println!("  COLLECTIVE2 STRATEGY TRADER  (strategy {strategy_id})");
    println!("{}", "=".repeat(100));
}

/// Top-level interactive loop.
pub async fn run<A, P, G>(
    session: &mut TradingSession<A, P, G>,
    refresh_interval_sec: u64,
) -> Result<()>
where
    A: AccountSource,
    P: PriceSource,
    G: SignalGateway,
{
    loop {
        clear_screen();
        header(session.strategy_id());
        println!();
        println!("  1. View open positions");
        println!("  2. Monitor positions (live, Ctrl-C to stop)");
        println!("  3. Submit a trade signal");
        println!("  4. Manage working orders");
        println!("  5. Exit");
        println!();

        let choice = prompt("Enter your choice [1-5]: ").await?;
        match choice.as_str() {
            "1" => {
                match session.positions_report(None).await {
                    Ok(report) => {
                        print!("{}", display::positions_table(&report));
                        print!("{}", display::portfolio_summary(&report.summary));
                    }
                    Err(e) => error!("positions fetch failed: {e:#}"),
                }
                let _ = prompt("\nPress Enter to return to the menu...").await?;
            }
            "2" => monitor(session, refresh_interval_sec).await?,
            "3" => {
                match guided_intent().await {
                    Ok(intent) => {
                        if let Err(e) = submit_with_confirm(session, &intent, false).await {
                            println!("\nSubmission failed: {e:#}");
                        }
                    }
                    Err(e) => error!("order entry failed: {e:#}"),
                }
                let _ = prompt("\nPress Enter to return to the menu...").await?;
            }
            "4" => manage_orders(session).await?,
            "5" => {
                println!("\nGoodbye.");
                return Ok(());
            }
            _ => {
                println!("  Please enter a number between 1 and 5.");
                let _ = prompt("\nPress Enter to continue...").await?;
            }
        }
    }
}

/// Live monitor: a timed wait then a full valuation pass, cancelled
/// immediately on Ctrl-C. The select! drops any in-flight fetch instead
/// of waiting it out.
pub async fn monitor<A, P, G>(
    session: &TradingSession<A, P, G>,
    interval_sec: u64,
) -> Result<()>
where
    A: AccountSource,
    P: PriceSource,
    G: SignalGateway,
{
    println!("\nRefreshing every {interval_sec}s. Press Ctrl-C to stop.");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_sec.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = session.positions_report(None) => match result {
                Ok(report) => {
                    clear_screen();
                    println!("Last updated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
                    print!("{}", display::positions_table(&report));
                    print!("{}", display::portfolio_summary(&report.summary));
                    println!("\nNext refresh in {interval_sec}s... (Ctrl-C to stop)");
                }
                Err(e) => error!("refresh failed: {e:#}"),
            }
        }
    }
    println!("\nMonitoring stopped.");
    Ok(())
}

/// Stage, preview, confirm, submit. Shared by the menu and the scripted
/// `submit` subcommand.
pub async fn submit_with_confirm<A, P, G>(
    session: &mut TradingSession<A, P, G>,
    intent: &SignalIntent,
    assume_yes: bool,
) -> Result<()>
where
    A: AccountSource,
    P: PriceSource,
    G: SignalGateway,
{
    // A replace target is validated against the platform's current list,
    // not a stale local one.
    if intent.cancel_replace.is_some() {
        session.refresh_orders().await?;
    }
    let plan = session.stage(intent)?;
    print!("{}", display::plan_preview(&plan));

    if !assume_yes && !confirm("Submit this order?").await? {
        println!("\nOrder canceled by operator; nothing was sent.");
        return Ok(());
    }

    let report = session.submit_plan(&plan).await?;
    print!("{}", display::submission_report(&report));
    Ok(())
}

/// Guided prompts mirroring the scripted flags.
async fn guided_intent() -> Result<SignalIntent> {
    println!("\nSUBMIT A TRADE SIGNAL");
    println!("{}", "-".repeat(80));

    let is_option = choose("Instrument type:", &["Stock", "Option"], 2).await? == 2;
    let symbol = prompt_required("Ticker symbol (e.g. AAPL, TSLA, NBIS): ")
        .await?
        .to_uppercase();

    let option = if is_option {
        let right = if choose("Call or put?", &["Call", "Put"], 1).await? == 1 {
            OptionRight::Call
        } else {
            OptionRight::Put
        };
        let strike: f64 = prompt_parse("Strike price (e.g. 150 or 150.00): ").await?;

        let today = Local::now().date_naive();
        let tomorrow = today + chrono::Duration::days(1);
        let this_friday = next_friday(today);
        let following_friday = friday_after_next(today);
        let labels = [
            format!("Today ({})", today.format("%m/%d/%y")),
            format!("Tomorrow ({})", tomorrow.format("%m/%d/%y")),
            format!("This week's Friday ({})", this_friday.format("%m/%d/%y")),
            format!("Next week's Friday ({})", following_friday.format("%m/%d/%y")),
            "Enter manually".to_string(),
        ];
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let expiry = match choose("Expiry date:", &label_refs, 3).await? {
            1 => today,
            2 => tomorrow,
            3 => this_friday,
            4 => following_friday,
            _ => loop {
                let raw = prompt_required("Expiry (MM/DD/YY, e.g. 10/24/25): ").await?;
                match parse_expiry(&raw) {
                    Ok(d) => break d,
                    Err(e) => println!("  {e}"),
                }
            },
        };
        Some(OptionIntent {
            right,
            strike,
            expiry,
        })
    } else {
        None
    };

    let action = if choose("Buy or sell?", &["Buy", "Sell"], 1).await? == 1 {
        TradeAction::Buy
    } else {
        TradeAction::Sell
    };

    let order_type = match choose("Order type:", &["Market", "Limit", "Stop"], 2).await? {
        1 => OrderType::Market,
        3 => OrderType::Stop,
        _ => OrderType::Limit,
    };
    let mut limit_price = None;
    let mut stop_price = None;
    match order_type {
        OrderType::Limit => limit_price = Some(prompt_parse("Limit price (e.g. 2.00): ").await?),
        OrderType::Stop => stop_price = Some(prompt_parse("Stop price (e.g. 2.00): ").await?),
        OrderType::Market => {}
    }

    let unit = if option.is_some() { "contracts" } else { "shares" };
    let quantity: u32 = prompt_parse(&format!("Quantity ({unit}): ")).await?;

    let tif = if choose("Time in force:", &["Day", "GTC (good till cancel)"], 1).await? == 1 {
        TimeInForce::Day
    } else {
        TimeInForce::GoodTillCancel
    };

    Ok(SignalIntent {
        symbol,
        action,
        quantity,
        order_type,
        limit_price,
        stop_price,
        tif,
        option,
        stop_loss: None,
        profit_target: None,
        cancel_replace: None,
        parent_signal: None,
    })
}

/// List, refresh and cancel working orders.
pub async fn manage_orders<A, P, G>(session: &mut TradingSession<A, P, G>) -> Result<()>
where
    A: AccountSource,
    P: PriceSource,
    G: SignalGateway,
{
    loop {
        println!("\nFetching working orders...");
        let orders = match session.refresh_orders().await {
            Ok(orders) => orders.to_vec(),
            Err(e) => {
                error!("order fetch failed: {e:#}");
                Vec::new()
            }
        };

        if orders.is_empty() {
            println!("\nNo working orders found.");
            if confirm("Refresh and check again?").await? {
                continue;
            }
            return Ok(());
        }

        print!("{}", display::orders_table(&orders));
        println!("\n  Enter an order number (1-{}) to cancel it", orders.len());
        println!("  Enter 'r' to refresh, 'q' to quit");

        let choice = prompt("\nYour choice: ").await?.to_lowercase();
        match choice.as_str() {
            "q" => return Ok(()),
            "r" => continue,
            n => {
                let Ok(index) = n.parse::<usize>() else {
                    println!("  Enter a number, 'r' or 'q'.");
                    continue;
                };
                if index == 0 || index > orders.len() {
                    println!("  Enter a number between 1 and {}.", orders.len());
                    continue;
                }
                let order = &orders[index - 1];
                println!("\n{}", display::order_line(order, index));
                if !confirm("Cancel this order?").await? {
                    println!("Cancellation aborted.");
                    continue;
                }
                match session.cancel_order(order.signal_id).await {
                    Ok(CancelOutcome::Cancelled) => {
                        println!("Signal {} cancelled.", order.signal_id)
                    }
                    Ok(CancelOutcome::NothingToDo) => {
                        println!("Signal {} was already done; nothing to cancel.", order.signal_id)
                    }
                    Err(e) => println!("Cancel failed: {e}"),
                }
            }
        }
    }
}
