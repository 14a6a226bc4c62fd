//! Load and validate runtime configuration.
//!
//! `config.yaml` holds the strategy identifiers, endpoints and timings;
//! the API credential stays out of the file and comes from `C2_API_KEY`
//! (a `.env` file works via dotenvy). When no config file exists,
//! `C2_STRATEGY_ID` alone is enough to run with the default endpoints.

use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

pub const DEFAULT_API_BASE: &str = "https://api4-general.collective2.com";
pub const DEFAULT_QUOTE_BASE: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyCfg {
    pub strategy_id: i64,
    pub person_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiCfg {
    #[serde(default = "default_api_base")]
    pub base_url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_sec: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingCfg {
    #[serde(default = "default_quote_base")]
    pub base_url: String,
    #[serde(default = "default_quote_timeout")]
    pub timeout_sec: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorCfg {
    /// Seconds between monitor refreshes. A policy default, not a
    /// protocol constant; `monitor --interval` overrides it.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_sec: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_quote_base() -> String {
    DEFAULT_QUOTE_BASE.to_string()
}
fn default_api_timeout() -> u64 {
    10
}
fn default_quote_timeout() -> u64 {
    5
}
fn default_refresh_interval() -> u64 {
    30
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            timeout_sec: default_api_timeout(),
        }
    }
}

impl Default for PricingCfg {
    fn default() -> Self {
        Self {
            base_url: default_quote_base(),
            timeout_sec: default_quote_timeout(),
        }
    }
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            refresh_interval_sec: default_refresh_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub strategy: StrategyCfg,
    #[serde(default)]
    pub api: ApiCfg,
    #[serde(default)]
    pub pricing: PricingCfg,
    #[serde(default)]
    pub monitor: MonitorCfg,
}

impl AppConfig {
    /// Resolve and load configuration. Search order: the explicit
    /// `--config` path, `./config.yaml`, then the platform config dir.
    /// With no file at all, `C2_STRATEGY_ID` in the environment yields a
    /// default configuration.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }
        if let Ok(sid) = std::env::var("C2_STRATEGY_ID") {
            let strategy_id: i64 = sid
                .parse()
                .with_context(|| format!("C2_STRATEGY_ID is not a number: {sid}"))?;
            let person_id = std::env::var("C2_PERSON_ID")
                .ok()
                .and_then(|v| v.parse().ok());
            return Ok(Self {
                strategy: StrategyCfg {
                    strategy_id,
                    person_id,
                },
                api: ApiCfg::default(),
                pricing: PricingCfg::default(),
                monitor: MonitorCfg::default(),
            });
        }
        anyhow::bail!(
            "no configuration found: create config.yaml (strategy.strategy_id), \
             or set C2_STRATEGY_ID in the environment"
        );
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut cfg: Self = serde_yaml::from_str(&s)
            .with_context(|| format!("parse config {}", path.display()))?;
        // The environment wins over the file for the strategy id, so one
        // install can drive several strategies.
        if let Ok(sid) = std::env::var("C2_STRATEGY_ID") {
            cfg.strategy.strategy_id = sid
                .parse()
                .with_context(|| format!("C2_STRATEGY_ID is not a number: {sid}"))?;
        }
        Ok(cfg)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut out = vec![PathBuf::from("config.yaml")];
        if let Some(dirs) = ProjectDirs::from("", "", "c2-strategy-trader") {
            out.push(dirs.config_dir().join("config.yaml"));
        }
        out
    }
}

/// The bearer credential for the platform API. Deliberately never stored
/// in the config file.
pub fn api_key() -> anyhow::Result<String> {
    std::env::var("C2_API_KEY")
        .context("C2_API_KEY is not set (export it or put it in a .env file)")
}
