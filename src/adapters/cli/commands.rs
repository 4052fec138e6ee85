//! CLI Commands
//!
//! Argument definitions for every pairwatch subcommand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/pairwatch.toml";

/// Pairwatch - New-pair watcher with rate-limited price collection
#[derive(Parser, Debug)]
#[command(
    name = "pairwatch",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Watch a DEX factory for new pairs and print their token prices",
    long_about = "Pairwatch follows a factory's PairCreated events, keeps pairs that \
                  include the reference token and prices both legs through a \
                  rate-limited Birdeye client before printing them."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch for new pairs and price them
    Run(RunCmd),

    /// Look up the current price of a single token
    Price(PriceCmd),
}

/// Start the watcher and the price queue
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the reference token address
    #[arg(long, value_name = "ADDRESS")]
    pub reference: Option<String>,
}

/// One-shot price lookup
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Token contract address
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
