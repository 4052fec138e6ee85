//! Pairwatch - New-Pair Watcher and Price Collector Library
//!
//! Follows a DEX factory's `PairCreated` events on BSC, keeps the pairs that
//! include a reference token and prices both legs through a rate-limited
//! Birdeye client.
//!
//! # Modules
//!
//! - `domain`: Pair records and price payload handling
//! - `ports`: Trait abstractions (PriceApi, PairEventSource, TokenMetadataSource, PairSink)
//! - `adapters`: External implementations (Birdeye, EVM, Console, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Price fetcher, price collection queue and pair watcher

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
