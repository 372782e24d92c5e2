//! Application configuration.
//!
//! Loaded from a TOML file; API credentials come from the environment only
//! and are never written to config files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use keel_core::Amount;
use keel_exchange::Credentials;
use keel_plan::SellPricePolicy;

const ENV_API_TOKEN_ID: &str = "KEEL_API_TOKEN_ID";
const ENV_API_SECRET_KEY: &str = "KEEL_API_SECRET_KEY";

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Single-shot: place one budget's worth of inventory, sell it off,
    /// stop when everything is terminal.
    #[default]
    Budget,
    /// Standing market maker: run until externally terminated.
    Standing,
}

/// One traded pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Base currency code, e.g. `ETH`.
    pub base_currency: String,
    /// Quoted currency code, e.g. `BTC`.
    pub quoted_currency: String,
}

impl PairConfig {
    pub fn pair_code(&self) -> String {
        format!("{}{}", self.base_currency, self.quoted_currency)
    }
}

/// Exchange endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_url() -> String {
    "https://api.exchange.example".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Metrics endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Listen address for `GET /metrics`. Default: `127.0.0.1:9100`.
    #[serde(default = "default_metrics_listen")]
    pub listen: String,
}

fn default_metrics_listen() -> String {
    "127.0.0.1:9100".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Total capital budget in the quote currency, split across pairs.
    pub capital: Amount,
    /// Required sell/buy price ratio before a position is closeable.
    /// Must be >= 1.0. Default: 1.01.
    #[serde(default = "default_minimum_split")]
    pub minimum_split: f64,
    /// Reconciliation cycle period (ms). Default: 10,000.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub sell_price_policy: SellPricePolicy,
    /// Pairs to trade; each runs as an independent engine.
    pub pairs: Vec<PairConfig>,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_minimum_split() -> f64 {
    1.01
}

fn default_cycle_interval_ms() -> u64 {
    10_000
}

impl AppConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.capital.is_positive() {
            return Err(AppError::InvalidConfig(
                "capital must be positive".to_string(),
            ));
        }
        if self.minimum_split < 1.0 {
            return Err(AppError::InvalidConfig(format!(
                "minimum_split must be >= 1.0, got {}",
                self.minimum_split
            )));
        }
        if self.pairs.is_empty() {
            return Err(AppError::InvalidConfig(
                "at least one pair is required".to_string(),
            ));
        }
        if self.cycle_interval_ms == 0 {
            return Err(AppError::InvalidConfig(
                "cycle_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange.request_timeout_ms)
    }
}

/// Read API credentials from the environment.
pub fn credentials_from_env() -> AppResult<Credentials> {
    let token_id =
        std::env::var(ENV_API_TOKEN_ID).map_err(|_| AppError::MissingEnv(ENV_API_TOKEN_ID))?;
    let secret =
        std::env::var(ENV_API_SECRET_KEY).map_err(|_| AppError::MissingEnv(ENV_API_SECRET_KEY))?;
    Ok(Credentials::new(token_id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        capital = "0.01000000"
        minimum_split = 1.02
        cycle_interval_ms = 5000
        mode = "standing"
        sell_price_policy = "inside_ask"

        [[pairs]]
        base_currency = "ETH"
        quoted_currency = "BTC"

        [[pairs]]
        base_currency = "LTC"
        quoted_currency = "BTC"

        [exchange]
        api_url = "https://api.test.example"

        [metrics]
        enabled = true
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(EXAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.capital, Amount::from_scaled(1_000_000));
        assert_eq!(config.minimum_split, 1.02);
        assert_eq!(config.mode, RunMode::Standing);
        assert_eq!(config.sell_price_policy, SellPricePolicy::InsideAsk);
        assert_eq!(config.pairs.len(), 2);
        assert_eq!(config.pairs[0].pair_code(), "ETHBTC");
        assert_eq!(config.exchange.api_url, "https://api.test.example");
        assert_eq!(config.exchange.request_timeout_ms, 10_000);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.listen, "127.0.0.1:9100");
    }

    #[test]
    fn test_defaults_apply() {
        let config: AppConfig = toml::from_str(
            r#"
            capital = "1.0"

            [[pairs]]
            base_currency = "ETH"
            quoted_currency = "BTC"
            "#,
        )
        .unwrap();
        assert_eq!(config.minimum_split, 1.01);
        assert_eq!(config.cycle_interval_ms, 10_000);
        assert_eq!(config.mode, RunMode::Budget);
        assert_eq!(config.sell_price_policy, SellPricePolicy::AtAsk);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_validation_rejects_bad_split() {
        let mut config: AppConfig = toml::from_str(EXAMPLE).unwrap();
        config.minimum_split = 0.99;
        assert!(matches!(
            config.validate(),
            Err(AppError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validation_rejects_empty_pairs() {
        let mut config: AppConfig = toml::from_str(EXAMPLE).unwrap();
        config.pairs.clear();
        assert!(config.validate().is_err());
    }
}
