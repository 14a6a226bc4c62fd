//! Command-line surface. Subcommands mirror the interactive menu; running
//! with no subcommand opens the menu.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::ValidationError;
use crate::signal::{OptionIntent, SignalIntent};
use crate::types::{OptionRight, OrderType, TimeInForce, TradeAction};
use crate::utils::parse_expiry;

#[derive(Debug, Parser)]
#[command(
    name = "c2-trader",
    version,
    about = "Manage a Collective2 strategy account from the terminal"
)]
pub struct Cli {
    /// Path to config.yaml (defaults to ./config.yaml, then the user
    /// config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// View open positions with live valuation
    Positions {
        /// Filter by security type
        #[arg(long, value_enum)]
        security_type: Option<SecurityTypeArg>,
        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Live position monitor, refreshed on an interval (Ctrl-C stops)
    Monitor {
        /// Refresh interval in seconds (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Submit a trade signal
    Submit(SubmitArgs),
    /// List and cancel working orders interactively
    Orders,
    /// Show your profile and the strategies you manage
    Discover,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecurityTypeArg {
    /// Stocks
    Cs,
    /// Futures
    Fut,
    /// Options
    Opt,
    /// Forex
    For,
}

impl SecurityTypeArg {
    pub fn as_wire(&self) -> &'static str {
        match self {
            SecurityTypeArg::Cs => "CS",
            SecurityTypeArg::Fut => "FUT",
            SecurityTypeArg::Opt => "OPT",
            SecurityTypeArg::For => "FOR",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Buy,
    Sell,
}

impl From<ActionArg> for TradeAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Buy => TradeAction::Buy,
            ActionArg::Sell => TradeAction::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderTypeArg {
    Market,
    Limit,
    Stop,
}

impl From<OrderTypeArg> for OrderType {
    fn from(o: OrderTypeArg) -> Self {
        match o {
            OrderTypeArg::Market => OrderType::Market,
            OrderTypeArg::Limit => OrderType::Limit,
            OrderTypeArg::Stop => OrderType::Stop,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TifArg {
    Day,
    Gtc,
}

impl From<TifArg> for TimeInForce {
    fn from(t: TifArg) -> Self {
        match t {
            TifArg::Day => TimeInForce::Day,
            TifArg::Gtc => TimeInForce::GoodTillCancel,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RightArg {
    Call,
    Put,
}

impl From<RightArg> for OptionRight {
    fn from(r: RightArg) -> Self {
        match r {
            RightArg::Call => OptionRight::Call,
            RightArg::Put => OptionRight::Put,
        }
    }
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Ticker symbol (e.g. AAPL, TSLA, NBIS)
    #[arg(long)]
    pub symbol: String,

    #[arg(long, value_enum)]
    pub action: ActionArg,

    /// Shares or contracts
    #[arg(long)]
    pub quantity: u32,

    #[arg(long, value_enum, default_value = "limit")]
    pub order_type: OrderTypeArg,

    /// Limit price (limit orders)
    #[arg(long)]
    pub limit: Option<f64>,

    /// Stop price (stop orders)
    #[arg(long)]
    pub stop: Option<f64>,

    #[arg(long, value_enum, default_value = "day")]
    pub tif: TifArg,

    /// Option right; requires --strike and --expiry too
    #[arg(long, value_enum)]
    pub option_type: Option<RightArg>,

    /// Option strike price
    #[arg(long)]
    pub strike: Option<f64>,

    /// Option expiry (e.g. 10/24/25, 2025-10-24, "Oct 24 2025")
    #[arg(long)]
    pub expiry: Option<String>,

    /// Bracket: stop-loss price for the opening order
    #[arg(long)]
    pub stop_loss: Option<f64>,

    /// Bracket: profit-target price for the opening order
    #[arg(long)]
    pub profit_target: Option<f64>,

    /// Cancel this working signal id and replace it with the new order
    #[arg(long)]
    pub cancel_replace: Option<i64>,

    /// Attach to a parent signal (conditional order)
    #[arg(long)]
    pub parent_signal: Option<i64>,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

impl SubmitArgs {
    /// Shape the raw flags into an intent. The option flags travel as a
    /// trio; a partial trio is caller error, caught here before any
    /// validation or network work.
    pub fn to_intent(&self) -> Result<SignalIntent, ValidationError> {
        let option = match (&self.option_type, self.strike, &self.expiry) {
            (None, None, None) => None,
            (Some(right), Some(strike), Some(expiry)) => Some(OptionIntent {
                right: (*right).into(),
                strike,
                expiry: parse_expiry(expiry)?,
            }),
            _ => return Err(ValidationError::IncompleteOption),
        };

        let mut intent = SignalIntent::new(
            &self.symbol,
            self.action.into(),
            self.quantity,
            self.order_type.into(),
        );
        intent.limit_price = self.limit;
        intent.stop_price = self.stop;
        intent.tif = self.tif.into();
        intent.option = option;
        intent.stop_loss = self.stop_loss;
        intent.profit_target = self.profit_target;
        intent.cancel_replace = self.cancel_replace;
        intent.parent_signal = self.parent_signal;
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(extra: &[&str]) -> SubmitArgs {
        let mut argv = vec![
            "c2-trader",
            "submit",
            "--symbol",
            "NBIS",
            "--action",
            "buy",
            "--quantity",
            "5",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command.unwrap() {
            Command::Submit(s) => s,
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_limit_day() {
        let a = args(&["--limit", "2.00"]);
        let intent = a.to_intent().unwrap();
        assert_eq!(intent.order_type, OrderType::Limit);
        assert_eq!(intent.tif, TimeInForce::Day);
        assert_eq!(intent.limit_price, Some(2.0));
    }

    #[test]
    fn option_trio_parses() {
        let a = args(&[
            "--limit",
            "2.00",
            "--option-type",
            "call",
            "--strike",
            "150",
            "--expiry",
            "10/24/25",
        ]);
        let intent = a.to_intent().unwrap();
        let o = intent.option.unwrap();
        assert_eq!(o.right, OptionRight::Call);
        assert_eq!(o.strike, 150.0);
        assert_eq!(o.expiry, NaiveDate::from_ymd_opt(2025, 10, 24).unwrap());
    }

    #[test]
    fn partial_option_trio_is_rejected() {
        let a = args(&["--limit", "2.00", "--option-type", "call"]);
        assert_eq!(a.to_intent().unwrap_err(), ValidationError::IncompleteOption);
    }

    #[test]
    fn bad_expiry_is_rejected() {
        let a = args(&[
            "--limit",
            "2.00",
            "--option-type",
            "call",
            "--strike",
            "150",
            "--expiry",
            "whenever",
        ]);
        assert!(matches!(
            a.to_intent().unwrap_err(),
            ValidationError::UnparseableExpiry(_)
        ));
    }

    #[test]
    fn market_order_via_flags() {
        let a = args(&["--order-type", "market", "--tif", "gtc"]);
        let intent = a.to_intent().unwrap();
        assert_eq!(intent.order_type, OrderType::Market);
        assert_eq!(intent.tif, TimeInForce::GoodTillCancel);
        assert_eq!(intent.limit_price, None);
    }

    #[test]
    fn bracket_and_replace_flags_pass_through() {
        let a = args(&[
            "--limit",
            "250.00",
            "--stop-loss",
            "245.00",
            "--profit-target",
            "260.00",
            "--cancel-replace",
            "144260505",
        ]);
        let intent = a.to_intent().unwrap();
        assert_eq!(intent.stop_loss, Some(245.0));
        assert_eq!(intent.profit_target, Some(260.0));
        assert_eq!(intent.cancel_replace, Some(144260505));
    }
}
