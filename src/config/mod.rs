//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    ChainSection, CollectorSection, Config, ConfigError, LoggingSection, PricingSection, load_config,
    validate_address,
};
