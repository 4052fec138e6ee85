//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Birdeye: token price HTTP API client
//! - EVM: factory event filter and ERC-20 metadata over JSON-RPC
//! - Console: colored pair printer
//! - CLI: Command-line interface definitions

pub mod birdeye;
pub mod cli;
pub mod console;
pub mod evm;

pub use birdeye::{BirdeyeClient, BirdeyeConfig};
pub use cli::CliApp;
pub use console::ConsolePrinter;
pub use evm::EvmChainClient;
