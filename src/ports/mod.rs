//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - The pricing HTTP API (`PriceApi`)
//! - The chain: factory event filter and token metadata calls
//! - The console output (`PairSink`)

pub mod chain;
pub mod mocks;
pub mod pricing;
pub mod sink;

pub use chain::{EventSourceError, MetadataError, PairEventSource, StartPosition, TokenMetadataSource};
pub use pricing::{PriceApi, PriceApiError, PriceApiResponse};
pub use sink::PairSink;
