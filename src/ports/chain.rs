//! Chain ports
//!
//! Event source for factory `PairCreated` logs and the ERC-20 metadata
//! lookup used to name both legs of a new pair.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PairCreatedEvent, TokenIdentity};

#[derive(Debug, Error)]
pub enum EventSourceError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Failed to decode log: {0}")]
    Decode(String),

    #[error("Filter not found or expired")]
    FilterExpired,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Contract call {call} failed for {address}: {reason}")]
    CallFailed {
        address: String,
        call: &'static str,
        reason: String,
    },
}

/// Where a new filter starts watching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Only events after the current chain head
    Latest,
    Block(u64),
}

#[async_trait]
pub trait PairEventSource: Send + Sync {
    /// Opaque server-side filter handle
    type Filter: Send + Sync;

    /// Install a pair-created filter starting at `from`
    async fn create_filter(&self, from: StartPosition) -> Result<Self::Filter, EventSourceError>;

    /// Entries that arrived since the previous call for this filter
    async fn new_entries(&self, filter: &Self::Filter) -> Result<Vec<PairCreatedEvent>, EventSourceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    /// Resolve `name()` and `symbol()` of the token contract at `address`
    async fn token_identity(&self, address: &str) -> Result<TokenIdentity, MetadataError>;
}
