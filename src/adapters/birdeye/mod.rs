//! Birdeye Adapter
//!
//! Implementation of the PriceApi port for the Birdeye public API
//! (`GET /defi/price?address=...`). The client performs exactly one HTTP
//! exchange per call; throttling and retries are handled by the fetcher.

mod client;

pub use client::{BirdeyeClient, BirdeyeConfig};
