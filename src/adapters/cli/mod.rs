//! CLI Adapter
//!
//! Command-line interface for the pair watcher.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, PriceCmd, RunCmd, DEFAULT_CONFIG_PATH};
