//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/pairwatch.toml.

use alloy::primitives::Address;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::application::collector::MAX_BATCH_SIZE;
use crate::application::price_fetcher::MIN_REQUEST_DELAY;

/// Main configuration structure matching pairwatch.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pricing: PricingSection,
    pub chain: ChainSection,
    #[serde(default)]
    pub collector: CollectorSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Pricing API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct PricingSection {
    /// Birdeye public API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API key (falls back to BIRDEYE_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Network tag sent as `x-chain`
    #[serde(default = "default_chain_tag")]
    pub chain: String,
    /// Request budget; gate width is max_requests_per_minute / 30
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: u32,
    /// Fixed delay before every admitted request
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Wait applied to a 429 without a Retry-After header
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
    /// HTTP timeout per request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Give up after this many consecutive 429s (unset = retry forever)
    #[serde(default)]
    pub max_throttle_retries: Option<u32>,
}

/// Chain RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    /// DEX factory emitting PairCreated
    pub factory_address: String,
    /// Only pairs with this token on one side are tracked
    pub reference_token: String,
    /// Prefix for transaction links in the output
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
    /// Idle time between filter polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl ChainSection {
    /// Get RPC URL with environment variable override
    /// Checks PAIRWATCH_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("PAIRWATCH_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Price collection queue section
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSection {
    /// Records priced per cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Sleep between cycles
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Drop a record after this many unpriced cycles (unset = keep forever)
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            cycle_interval_secs: default_cycle_interval_secs(),
            max_attempts: None,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_api_url() -> String {
    "https://public-api.birdeye.so".to_string()
}

fn default_chain_tag() -> String {
    "bsc".to_string()
}

fn default_max_requests_per_minute() -> u32 {
    60
}

fn default_request_delay_ms() -> u64 {
    2000
}

fn default_retry_after_secs() -> u64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_explorer_tx_url() -> String {
    "https://bscscan.com/tx/".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    30
}

fn default_cycle_interval_secs() -> u64 {
    180
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Pricing
        if self.pricing.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "pricing.api_url cannot be empty".to_string(),
            ));
        }

        if self.pricing.chain.is_empty() {
            return Err(ConfigError::ValidationError(
                "pricing.chain cannot be empty".to_string(),
            ));
        }

        if self.pricing.max_requests_per_minute < 30 {
            return Err(ConfigError::ValidationError(format!(
                "max_requests_per_minute must be >= 30, got {}",
                self.pricing.max_requests_per_minute
            )));
        }

        if Duration::from_millis(self.pricing.request_delay_ms) < MIN_REQUEST_DELAY {
            return Err(ConfigError::ValidationError(format!(
                "request_delay_ms must be >= {}, got {}",
                MIN_REQUEST_DELAY.as_millis(),
                self.pricing.request_delay_ms
            )));
        }

        if self.pricing.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        // Chain
        if self.chain.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.chain.factory_address.is_empty() {
            return Err(ConfigError::ValidationError(
                "factory_address cannot be empty".to_string(),
            ));
        }

        if self.chain.reference_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "reference_token cannot be empty".to_string(),
            ));
        }

        validate_address("factory_address", &self.chain.factory_address)?;
        validate_address("reference_token", &self.chain.reference_token)?;

        if self.chain.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }

        // Collector
        if self.collector.batch_size == 0 || self.collector.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.collector.batch_size
            )));
        }

        if self.collector.cycle_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_interval_secs must be > 0".to_string(),
            ));
        }

        if self.collector.max_attempts == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_attempts must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reject anything that is not a 20-byte hex address
pub fn validate_address(field: &str, value: &str) -> Result<(), ConfigError> {
    Address::from_str(value)
        .map(|_| ())
        .map_err(|e| ConfigError::ValidationError(format!("{} '{}' is not a valid address: {}", field, value, e)))
}

impl PricingSection {
    /// Get API key with environment variable fallback
    /// Checks BIRDEYE_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("BIRDEYE_API_KEY").ok()
    }
}

// Conversion from Config to the fetcher's runtime settings
impl From<&Config> for crate::application::price_fetcher::FetcherConfig {
    fn from(config: &Config) -> Self {
        crate::application::price_fetcher::FetcherConfig {
            max_requests_per_minute: config.pricing.max_requests_per_minute,
            request_delay: Duration::from_millis(config.pricing.request_delay_ms),
            default_retry_after: Duration::from_secs(config.pricing.default_retry_after_secs),
            max_throttle_retries: config.pricing.max_throttle_retries,
        }
    }
}

impl From<&Config> for crate::application::collector::CollectorConfig {
    fn from(config: &Config) -> Self {
        crate::application::collector::CollectorConfig {
            batch_size: config.collector.batch_size,
            cycle_interval: Duration::from_secs(config.collector.cycle_interval_secs),
            max_attempts: config.collector.max_attempts,
        }
    }
}
