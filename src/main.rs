//! Entry point. Wires CLI -> SignalBuilder -> OrderLifecycleManager -> Collective2.

mod c2_client;
mod cli;
mod config;
mod display;
mod error;
mod menu;
mod orders;
mod pricing;
mod session;
mod signal;
mod types;
mod utils;
mod valuation;
mod yahoo;

use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::c2_client::C2Client;
use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::pricing::PriceOracle;
use crate::session::TradingSession;
use crate::yahoo::YahooQuotes;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;
    let api_key = config::api_key()?;

    let c2 = C2Client::new(
        &cfg.api.base_url,
        &api_key,
        cfg.strategy.strategy_id,
        Duration::from_secs(cfg.api.timeout_sec),
    )?;
    let quotes = YahooQuotes::new(
        &cfg.pricing.base_url,
        Duration::from_secs(cfg.pricing.timeout_sec),
    )?;

    // One strategy context per run: every operation below goes through
    // this session value, nothing global.
    let mut session = TradingSession::new(
        cfg.strategy.strategy_id,
        c2.clone(),
        PriceOracle::new(quotes),
        c2.clone(),
    );
    info!("session ready for strategy {}", session.strategy_id());

    match cli.command {
        None => menu::run(&mut session, cfg.monitor.refresh_interval_sec).await?,
        Some(Command::Positions {
            security_type,
            json,
        }) => {
            let filter = security_type.map(|t| t.as_wire());
            let report = session.positions_report(filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", display::positions_table(&report));
                print!("{}", display::portfolio_summary(&report.summary));
            }
        }
        Some(Command::Monitor { interval }) => {
            let interval = interval.unwrap_or(cfg.monitor.refresh_interval_sec);
            menu::monitor(&session, interval).await?;
        }
        Some(Command::Submit(args)) => {
            let intent = args.to_intent()?;
            menu::submit_with_confirm(&mut session, &intent, args.yes).await?;
        }
        Some(Command::Orders) => menu::manage_orders(&mut session).await?,
        Some(Command::Discover) => {
            let profile = c2.profile().await?;
            let person_id = cfg.strategy.person_id.or(profile.person_id);
            let strategies = c2.managed_strategies(person_id).await?;
            print!("{}", display::discovery(&profile, &strategies));
        }
    }

    Ok(())
}
