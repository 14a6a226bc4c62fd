//! Collective2 REST client: positions, account details, working orders,
//! signal submission and cancels, plus the discovery endpoints.
//!
//! The platform serves JSON with inconsistent key casing across
//! endpoints, so responses are walked as `serde_json::Value` with
//! dual-cased lookups instead of rigid structs.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::SubmissionError;
use crate::orders::SignalGateway;
use crate::session::AccountSource;
use crate::types::{
    AccountSnapshot, Instrument, OptionRight, OptionSpec, OrderStatus, OrderType, Position,
    SecurityKind, Signal, SignalReceipt, TimeInForce, TradeAction, WorkingOrder,
};
use crate::utils::{maturity_month_year, parse_expiry};

#[derive(Clone)]
pub struct C2Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    strategy_id: i64,
}

/// Operator profile, for discovery mode.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub person_id: Option<i64>,
    pub alias: Option<String>,
    pub email: Option<String>,
    pub is_manager: bool,
    pub is_investor: bool,
}

#[derive(Debug, Clone)]
pub struct ManagedStrategy {
    pub strategy_id: i64,
    pub name: String,
    pub is_alive: Option<bool>,
}

impl C2Client {
    pub fn new(
        base_url: &str,
        api_key: &str,
        strategy_id: i64,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build platform http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            strategy_id,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {path}"))?;
        resp.json().await.with_context(|| format!("GET {path} body"))
    }

    pub async fn strategy_positions(&self, security_type: Option<&str>) -> Result<Vec<Position>> {
        let mut query = vec![("StrategyIds", self.strategy_id.to_string())];
        if let Some(t) = security_type {
            query.push(("SecurityType", t.to_string()));
        }
        let body = self
            .get_json("/Strategies/GetStrategyOpenPositions", &query)
            .await?;
        parse_positions(&body)
    }

    pub async fn strategy_details(&self) -> Result<AccountSnapshot> {
        let body = self
            .get_json(
                "/Strategies/GetStrategyDetails",
                &[("StrategyId", self.strategy_id.to_string())],
            )
            .await?;
        Ok(parse_snapshot(&body))
    }

    async fn fetch_working_orders(&self) -> Result<Vec<WorkingOrder>, SubmissionError> {
        let body = self
            .get_json(
                "/Strategies/GetStrategyWorkingOrders",
                &[("StrategyId", self.strategy_id.to_string())],
            )
            .await
            .map_err(|e| SubmissionError::Transport(format!("{e:#}")))?;
        Ok(parse_working_orders(&body))
    }

    pub async fn profile(&self) -> Result<Profile> {
        let body = self.get_json("/General/GetProfile", &[]).await?;
        let first = results(&body).first().cloned().unwrap_or(Value::Null);
        Ok(Profile {
            person_id: i64_field(&first, &["Id", "id"]),
            alias: str_field(&first, &["Alias", "alias"]),
            email: str_field(&first, &["Email", "email"]),
            is_manager: bool_field(&first, &["IsManager", "isManager"]).unwrap_or(false),
            is_investor: bool_field(&first, &["IsInvestor", "isInvestor"]).unwrap_or(false),
        })
    }

    pub async fn managed_strategies(&self, person_id: Option<i64>) -> Result<Vec<ManagedStrategy>> {
        let mut query = Vec::new();
        if let Some(pid) = person_id {
            query.push(("PersonId", pid.to_string()));
        }
        let body = self
            .get_json("/General/GetManagerPlanSubscriptions", &query)
            .await?;
        let out = results(&body)
            .iter()
            .filter_map(|row| {
                Some(ManagedStrategy {
                    strategy_id: i64_field(row, &["StrategyId", "strategyId"])?,
                    name: str_field(row, &["StrategyName", "strategyName"])
                        .unwrap_or_else(|| "unnamed".into()),
                    is_alive: bool_field(row, &["IsAlive", "isAlive"]),
                })
            })
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl AccountSource for C2Client {
    async fn open_positions(&self, security_type: Option<&str>) -> Result<Vec<Position>> {
        self.strategy_positions(security_type).await
    }

    async fn account_snapshot(&self) -> Result<AccountSnapshot> {
        self.strategy_details().await
    }
}

#[async_trait]
impl SignalGateway for C2Client {
    async fn submit(&self, signal: &Signal) -> Result<SignalReceipt, SubmissionError> {
        let payload = order_payload(signal, self.strategy_id);
        let url = format!("{}/Strategies/NewStrategyOrder", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            // The platform answered: surface its reason verbatim.
            return Err(SubmissionError::Rejected(format!("HTTP {status}: {text}")));
        }
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| SubmissionError::Rejected(format!("unparseable response ({e}): {text}")))?;
        parse_receipt(&body)
    }

    async fn cancel(&self, signal_id: i64) -> Result<(), SubmissionError> {
        let url = format!("{}/Strategies/CancelSignal", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "StrategyId": self.strategy_id,
                "SignalId": signal_id,
            }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected(format!("HTTP {status}: {text}")));
        }
        Ok(())
    }

    async fn working_orders(&self) -> Result<Vec<WorkingOrder>, SubmissionError> {
        self.fetch_working_orders().await
    }
}

// ---------------- Value walking ----------------

fn field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| v.get(k)).filter(|x| !x.is_null())
}

fn str_field(v: &Value, keys: &[&str]) -> Option<String> {
    field(v, keys).and_then(Value::as_str).map(str::to_string)
}

fn f64_field(v: &Value, keys: &[&str]) -> Option<f64> {
    match field(v, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn i64_field(v: &Value, keys: &[&str]) -> Option<i64> {
    match field(v, keys)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_field(v: &Value, keys: &[&str]) -> Option<bool> {
    field(v, keys).and_then(Value::as_bool)
}

fn results(body: &Value) -> Vec<Value> {
    field(body, &["Results", "results"])
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn parse_timestamp(v: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = str_field(v, keys)?;
    DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| {
            // Some endpoints omit the offset.
            chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
}

// ---------------- Response parsing ----------------

pub(crate) fn parse_positions(body: &Value) -> Result<Vec<Position>> {
    let mut out = Vec::new();
    for row in results(body) {
        let c2_symbol = field(&row, &["C2Symbol", "c2Symbol"]).cloned().unwrap_or(Value::Null);
        let full_symbol = str_field(&c2_symbol, &["FullSymbol", "fullSymbol"])
            .or_else(|| str_field(&row, &["Symbol", "symbol"]))
            .context("position row has no symbol")?;
        let quantity =
            f64_field(&row, &["Quantity", "quantity"]).context("position row has no quantity")?;
        let avg_cost = f64_field(&row, &["AvgPx", "avgPx"]).unwrap_or(0.0);
        if avg_cost < 0.0 {
            anyhow::bail!("position {full_symbol} reports a negative cost basis {avg_cost}");
        }
        let opened = parse_timestamp(&row, &["OpenedDate", "openedDate"]);

        let symbol_type = str_field(&c2_symbol, &["SymbolType", "symbolType"])
            .unwrap_or_else(|| "stock".into())
            .to_ascii_lowercase();
        let instrument = match symbol_type.as_str() {
            "option" => parse_option_instrument(&full_symbol, &c2_symbol).unwrap_or_else(|| {
                warn!("could not resolve option details for {full_symbol}; pricing as a bare symbol");
                Instrument::equity(full_symbol.clone())
            }),
            "future" => Instrument::future(
                str_field(&c2_symbol, &["Underlying", "underlying"]).unwrap_or(full_symbol.clone()),
            ),
            "forex" => Instrument::forex(
                str_field(&c2_symbol, &["Underlying", "underlying"]).unwrap_or(full_symbol.clone()),
            ),
            _ => Instrument::equity(
                str_field(&c2_symbol, &["Underlying", "underlying"]).unwrap_or(full_symbol.clone()),
            ),
        };

        out.push(Position {
            instrument,
            quantity,
            avg_cost,
            opened,
        });
    }
    Ok(out)
}

fn parse_option_instrument(full_symbol: &str, c2_symbol: &Value) -> Option<Instrument> {
    let underlying = str_field(c2_symbol, &["Underlying", "underlying"])?;
    let strike = f64_field(c2_symbol, &["StrikePrice", "strikePrice"])?;
    let right = match field(c2_symbol, &["PutOrCall", "putOrCall"])? {
        Value::String(s) if s.eq_ignore_ascii_case("call") => OptionRight::Call,
        Value::String(s) if s.eq_ignore_ascii_case("put") => OptionRight::Put,
        Value::Number(n) if n.as_i64() == Some(1) => OptionRight::Call,
        Value::Number(n) if n.as_i64() == Some(0) => OptionRight::Put,
        _ => return None,
    };
    let expiry = parse_expiry(&str_field(c2_symbol, &["Expiry", "expiry"])?).ok()?;
    Instrument::option_with_symbol(
        full_symbol,
        OptionSpec {
            underlying,
            right,
            strike,
            expiry,
        },
    )
    .ok()
}

pub(crate) fn parse_snapshot(body: &Value) -> AccountSnapshot {
    let first = results(body).first().cloned().unwrap_or(Value::Null);
    AccountSnapshot {
        equity: f64_field(&first, &["Equity", "equity"]).unwrap_or(0.0),
        cash: f64_field(&first, &["Cash", "cash"]).unwrap_or(0.0),
        buying_power: f64_field(&first, &["BuyingPower", "buyingPower"]).unwrap_or(0.0),
        model_account_value: f64_field(&first, &["ModelAccountValue", "modelAccountValue"])
            .unwrap_or(0.0),
        starting_cash: f64_field(&first, &["StartingCash", "startingCash"]).unwrap_or(0.0),
        margin_used: f64_field(&first, &["MarginUsed", "marginUsed"]).unwrap_or(0.0),
        num_trades: i64_field(&first, &["NumTrades", "numTrades"]).unwrap_or(0) as u32,
        num_winners: i64_field(&first, &["NumWinners", "numWinners"]).unwrap_or(0) as u32,
        num_losers: i64_field(&first, &["NumLosers", "numLosers"]).unwrap_or(0) as u32,
        percent_win_trades: f64_field(&first, &["PercentWinTrades", "percentWinTrades"])
            .unwrap_or(0.0),
    }
}

pub(crate) fn parse_working_orders(body: &Value) -> Vec<WorkingOrder> {
    let mut out = Vec::new();
    for row in results(body) {
        let Some(signal_id) = i64_field(&row, &["SignalId", "signalId", "id"]) else {
            warn!("working order row without a signal id, skipping");
            continue;
        };
        let c2_symbol = field(&row, &["C2Symbol", "c2Symbol"]).cloned().unwrap_or(Value::Null);
        let symbol = str_field(&c2_symbol, &["FullSymbol", "fullSymbol"])
            .or_else(|| str_field(&row, &["Symbol", "symbol"]))
            .unwrap_or_else(|| "N/A".into());

        let order_type = match field(&row, &["OrderType", "orderType"]) {
            Some(v) => match value_as_code(v).as_deref() {
                Some("1") => OrderType::Market,
                Some("2") => OrderType::Limit,
                Some("3") => OrderType::Stop,
                other => {
                    warn!("unknown order type {other:?} on signal {signal_id}, assuming market");
                    OrderType::Market
                }
            },
            None => OrderType::Market,
        };
        let action = match field(&row, &["Side", "side"]).and_then(|v| value_as_code(v)) {
            Some(code) if code == "2" => TradeAction::Sell,
            _ => TradeAction::Buy,
        };
        let quantity = i64_field(&row, &["OrderQuantity", "orderQuantity"]).unwrap_or(0).max(0)
            as u32;
        let status = map_status(
            &str_field(&row, &["OrderStatus", "orderStatus"]).unwrap_or_else(|| "working".into()),
            signal_id,
        );

        out.push(WorkingOrder {
            signal_id,
            symbol,
            action,
            quantity,
            order_type,
            limit_price: f64_field(&row, &["Limit", "limit"]),
            stop_price: f64_field(&row, &["Stop", "stop"]),
            status,
            posted: parse_timestamp(&row, &["PostedDate", "postedDate"]),
        });
    }
    out
}

fn value_as_code(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map the platform's status spellings onto the lifecycle states. An
/// unknown status keeps the order in the working set rather than silently
/// dropping it.
pub(crate) fn map_status(raw: &str, signal_id: i64) -> OrderStatus {
    match raw.to_ascii_lowercase().as_str() {
        "working" | "open" | "pending" | "1" => OrderStatus::Working,
        "filled" | "2" => OrderStatus::Filled,
        "canceled" | "cancelled" | "expired" | "4" | "c" => OrderStatus::Cancelled,
        "rejected" => OrderStatus::Rejected,
        other => {
            warn!("unknown order status '{other}' on signal {signal_id}, keeping it working");
            OrderStatus::Working
        }
    }
}

pub(crate) fn parse_receipt(body: &Value) -> Result<SignalReceipt, SubmissionError> {
    let first = results(body).first().cloned().unwrap_or(Value::Null);
    match i64_field(&first, &["SignalId", "signalId"]) {
        Some(signal_id) => Ok(SignalReceipt { signal_id }),
        None => Err(SubmissionError::Rejected(format!(
            "response carried no signal id: {body}"
        ))),
    }
}

// ---------------- Request building ----------------

/// The platform's order payload. Order type, side and TIF travel as the
/// platform's numeric codes; prices travel as decimal strings.
pub(crate) fn order_payload(signal: &Signal, strategy_id: i64) -> Value {
    let order_type = match signal.order_type {
        OrderType::Market => "1",
        OrderType::Limit => "2",
        OrderType::Stop => "3",
    };
    let side = match signal.action {
        TradeAction::Buy => "1",
        TradeAction::Sell => "2",
    };
    let tif = match signal.tif {
        TimeInForce::Day => "0",
        TimeInForce::GoodTillCancel => "1",
    };

    let mut order = serde_json::Map::new();
    order.insert("StrategyId".into(), json!(strategy_id));
    order.insert("OrderType".into(), json!(order_type));
    order.insert("Side".into(), json!(side));
    order.insert("OrderQuantity".into(), json!(signal.quantity));
    order.insert("TIF".into(), json!(tif));
    if let Some(px) = signal.limit_price {
        order.insert("Limit".into(), Value::String(px.to_string()));
    }
    if let Some(px) = signal.stop_price {
        order.insert("Stop".into(), Value::String(px.to_string()));
    }
    if let Some(id) = signal.cancel_replace {
        order.insert("CancelReplaceSignalId".into(), json!(id));
    }
    if let Some(id) = signal.parent_signal {
        order.insert("ParentSignalId".into(), json!(id));
    }
    order.insert("ExchangeSymbol".into(), exchange_symbol(&signal.instrument));

    json!({ "Order": Value::Object(order) })
}

fn exchange_symbol(instrument: &Instrument) -> Value {
    match instrument.option_spec() {
        Some(spec) => json!({
            "Symbol": spec.underlying,
            "Currency": "USD",
            "SecurityExchange": "DEFAULT",
            "SecurityType": "OPT",
            "MaturityMonthYear": maturity_month_year(spec.expiry),
            "PutOrCall": match spec.right {
                OptionRight::Call => 1,
                OptionRight::Put => 0,
            },
            "StrikePrice": spec.strike,
        }),
        None => json!({
            "Symbol": instrument.symbol(),
            "Currency": "USD",
            "SecurityType": match instrument.kind() {
                SecurityKind::Future => "FUT",
                SecurityKind::Forex => "FOR",
                _ => "CS",
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_stock_and_option_positions() {
        let body = json!({ "Results": [
            {
                "C2Symbol": { "FullSymbol": "AAPL", "SymbolType": "stock", "Underlying": "AAPL" },
                "Quantity": 10,
                "AvgPx": 180.55,
                "OpenedDate": "2025-10-06T09:30:00Z"
            },
            {
                "C2Symbol": {
                    "FullSymbol": "NBIS2524J150",
                    "SymbolType": "option",
                    "Underlying": "NBIS",
                    "StrikePrice": 150,
                    "PutOrCall": "call",
                    "Expiry": "Oct25"
                },
                "Quantity": 14,
                "AvgPx": 1.58
            }
        ]});
        let positions = parse_positions(&body).unwrap();
        assert_eq!(positions.len(), 2);

        assert_eq!(positions[0].instrument.symbol(), "AAPL");
        assert_eq!(positions[0].quantity, 10.0);
        assert_eq!(positions[0].avg_cost, 180.55);
        assert!(positions[0].opened.is_some());

        let opt = &positions[1];
        assert_eq!(opt.instrument.symbol(), "NBIS2524J150");
        let spec = opt.instrument.option_spec().unwrap();
        assert_eq!(spec.underlying, "NBIS");
        assert_eq!(spec.strike, 150.0);
        assert_eq!(spec.right, OptionRight::Call);
        // "Oct25" resolves to the monthly expiration.
        assert_eq!(spec.expiry, d(2025, 10, 17));
    }

    #[test]
    fn lowercase_keys_and_short_positions_parse() {
        let body = json!({ "results": [ {
            "c2Symbol": { "fullSymbol": "TSLA", "symbolType": "stock" },
            "quantity": -5,
            "avgPx": "250.00"
        } ]});
        let positions = parse_positions(&body).unwrap();
        assert_eq!(positions[0].quantity, -5.0);
        assert_eq!(positions[0].avg_cost, 250.0);
        assert!(!positions[0].is_long());
    }

    #[test]
    fn option_with_unreadable_expiry_degrades_to_bare_symbol() {
        let body = json!({ "Results": [ {
            "C2Symbol": {
                "FullSymbol": "XYZ_BROKEN",
                "SymbolType": "option",
                "Underlying": "XYZ",
                "StrikePrice": 10,
                "PutOrCall": "call",
                "Expiry": "???"
            },
            "Quantity": 1,
            "AvgPx": 0.5
        } ]});
        let positions = parse_positions(&body).unwrap();
        assert_eq!(positions[0].instrument.kind(), SecurityKind::Equity);
        assert_eq!(positions[0].instrument.symbol(), "XYZ_BROKEN");
    }

    #[test]
    fn malformed_position_rows_abort_parsing() {
        let no_symbol = json!({ "Results": [ { "Quantity": 1 } ] });
        assert!(parse_positions(&no_symbol).is_err());

        let negative_basis = json!({ "Results": [ {
            "C2Symbol": { "FullSymbol": "AAPL", "SymbolType": "stock" },
            "Quantity": 1,
            "AvgPx": -4.0
        } ]});
        assert!(parse_positions(&negative_basis).is_err());
    }

    #[test]
    fn snapshot_passes_figures_through() {
        let body = json!({ "Results": [ {
            "Equity": 5000.0, "Cash": 42000.5, "BuyingPower": 84000.0,
            "ModelAccountValue": 47000.0, "StartingCash": 50000.0,
            "MarginUsed": 0.0, "NumTrades": 12, "NumWinners": 7,
            "NumLosers": 5, "PercentWinTrades": 58.3
        } ]});
        let snap = parse_snapshot(&body);
        assert_eq!(snap.cash, 42000.5);
        assert_eq!(snap.num_trades, 12);
        assert_eq!(snap.percent_win_trades, 58.3);
        // Absent details collapse to zeros, not an error.
        assert_eq!(parse_snapshot(&json!({})), AccountSnapshot::default());
    }

    #[test]
    fn parses_working_orders_with_code_fields() {
        let body = json!({ "Results": [
            {
                "SignalId": 144260505,
                "C2Symbol": { "FullSymbol": "TSLA" },
                "OrderType": "2",
                "Side": "2",
                "OrderQuantity": 5,
                "Limit": "250.00",
                "OrderStatus": "Working",
                "PostedDate": "2025-10-06T14:05:00Z"
            },
            {
                "signalId": "144260999",
                "c2Symbol": { "fullSymbol": "AAPL" },
                "orderType": 3,
                "side": 1,
                "orderQuantity": 10,
                "stop": 180.5,
                "orderStatus": "filled"
            }
        ]});
        let orders = parse_working_orders(&body);
        assert_eq!(orders.len(), 2);

        assert_eq!(orders[0].signal_id, 144260505);
        assert_eq!(orders[0].action, TradeAction::Sell);
        assert_eq!(orders[0].order_type, OrderType::Limit);
        assert_eq!(orders[0].limit_price, Some(250.0));
        assert_eq!(orders[0].status, OrderStatus::Working);

        assert_eq!(orders[1].signal_id, 144260999);
        assert_eq!(orders[1].order_type, OrderType::Stop);
        assert_eq!(orders[1].stop_price, Some(180.5));
        assert_eq!(orders[1].status, OrderStatus::Filled);
    }

    #[test]
    fn status_mapping_covers_platform_spellings() {
        assert_eq!(map_status("Working", 1), OrderStatus::Working);
        assert_eq!(map_status("open", 1), OrderStatus::Working);
        assert_eq!(map_status("FILLED", 1), OrderStatus::Filled);
        assert_eq!(map_status("canceled", 1), OrderStatus::Cancelled);
        assert_eq!(map_status("cancelled", 1), OrderStatus::Cancelled);
        assert_eq!(map_status("expired", 1), OrderStatus::Cancelled);
        assert_eq!(map_status("rejected", 1), OrderStatus::Rejected);
        // Unknown spellings stay in the working set.
        assert_eq!(map_status("limbo", 1), OrderStatus::Working);
    }

    #[test]
    fn receipt_needs_a_signal_id() {
        let ok = json!({ "Results": [ { "SignalId": 144260505 } ] });
        assert_eq!(parse_receipt(&ok).unwrap().signal_id, 144260505);

        let as_string = json!({ "Results": [ { "SignalId": "144260505" } ] });
        assert_eq!(parse_receipt(&as_string).unwrap().signal_id, 144260505);

        let empty = json!({ "Results": [] });
        assert!(matches!(
            parse_receipt(&empty),
            Err(SubmissionError::Rejected(_))
        ));
    }

    #[test]
    fn stock_market_order_payload() {
        let signal = Signal {
            action: TradeAction::Buy,
            instrument: Instrument::equity("AAPL"),
            quantity: 10,
            order_type: OrderType::Market,
            limit_price: None,
            stop_price: None,
            tif: TimeInForce::Day,
            cancel_replace: None,
            parent_signal: None,
        };
        let payload = order_payload(&signal, 153075915);
        let order = &payload["Order"];
        assert_eq!(order["StrategyId"], 153075915);
        assert_eq!(order["OrderType"], "1");
        assert_eq!(order["Side"], "1");
        assert_eq!(order["OrderQuantity"], 10);
        assert_eq!(order["TIF"], "0");
        assert!(order.get("Limit").is_none());
        assert!(order.get("Stop").is_none());
        assert_eq!(order["ExchangeSymbol"]["Symbol"], "AAPL");
        assert_eq!(order["ExchangeSymbol"]["SecurityType"], "CS");
        assert_eq!(order["ExchangeSymbol"]["Currency"], "USD");
    }

    #[test]
    fn option_limit_order_payload() {
        let instrument =
            Instrument::option("NBIS", OptionRight::Call, 150.0, d(2025, 10, 24)).unwrap();
        let signal = Signal {
            action: TradeAction::Buy,
            instrument,
            quantity: 5,
            order_type: OrderType::Limit,
            limit_price: Some(2.0),
            stop_price: None,
            tif: TimeInForce::GoodTillCancel,
            cancel_replace: None,
            parent_signal: None,
        };
        let payload = order_payload(&signal, 153075915);
        let order = &payload["Order"];
        assert_eq!(order["OrderType"], "2");
        assert_eq!(order["Limit"], "2");
        assert_eq!(order["TIF"], "1");
        let sym = &order["ExchangeSymbol"];
        assert_eq!(sym["Symbol"], "NBIS");
        assert_eq!(sym["SecurityType"], "OPT");
        assert_eq!(sym["SecurityExchange"], "DEFAULT");
        assert_eq!(sym["MaturityMonthYear"], "20251024");
        assert_eq!(sym["PutOrCall"], 1);
        assert_eq!(sym["StrikePrice"], 150.0);
    }

    #[test]
    fn child_order_payload_carries_parent_and_stop() {
        let signal = Signal {
            action: TradeAction::Sell,
            instrument: Instrument::equity("TSLA"),
            quantity: 5,
            order_type: OrderType::Stop,
            limit_price: None,
            stop_price: Some(245.0),
            tif: TimeInForce::Day,
            cancel_replace: None,
            parent_signal: Some(144260505),
        };
        let payload = order_payload(&signal, 153075915);
        let order = &payload["Order"];
        assert_eq!(order["OrderType"], "3");
        assert_eq!(order["Side"], "2");
        assert_eq!(order["Stop"], "245");
        assert_eq!(order["ParentSignalId"], 144260505);
        assert!(order.get("CancelReplaceSignalId").is_none());
    }
}
