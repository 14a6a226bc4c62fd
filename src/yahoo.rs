//! Thin Yahoo Finance chart-endpoint client used as the live price source.
//!
//! One GET per symbol with a bounded timeout. "The venue has no data for
//! this symbol" (404, empty result, null closes) is `Ok(None)`, distinct
//! from transport failures, so the oracle can tell dead symbols from a
//! dead network.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::pricing::PriceSource;

pub struct YahooQuotes {
    http: reqwest::Client,
    base_url: String,
}

impl YahooQuotes {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; c2-strategy-trader/1.0)")
            .build()
            .context("build quote http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chart(&self, symbol: &str, range: &str, interval: &str) -> Result<Option<f64>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let resp = self
            .http
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await
            .with_context(|| format!("quote request for {symbol}"))?;

        // Unknown symbols come back 404 with an error body.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = resp
            .error_for_status()
            .with_context(|| format!("quote response for {symbol}"))?
            .json()
            .await
            .with_context(|| format!("quote body for {symbol}"))?;
        Ok(extract_last_price(&body))
    }
}

#[async_trait]
impl PriceSource for YahooQuotes {
    async fn last_price(&self, symbol: &str) -> Result<Option<f64>> {
        // Intraday first; thinly traded contracts often only have daily bars.
        if let Some(px) = self.chart(symbol, "1d", "1m").await? {
            return Ok(Some(px));
        }
        self.chart(symbol, "5d", "1d").await
    }
}

/// Pull the freshest price out of a chart response: the meta's regular
/// market price when present, otherwise the last non-null close.
fn extract_last_price(body: &Value) -> Option<f64> {
    let result = body.get("chart")?.get("result")?.get(0)?;
    if let Some(px) = result
        .get("meta")
        .and_then(|m| m.get("regularMarketPrice"))
        .and_then(Value::as_f64)
    {
        return Some(px);
    }
    result
        .get("indicators")?
        .get("quote")?
        .get(0)?
        .get("close")?
        .as_array()?
        .iter()
        .rev()
        .find_map(Value::as_f64)
}
