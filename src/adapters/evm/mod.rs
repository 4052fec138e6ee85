//! EVM Adapter
//!
//! Chain access over HTTP JSON-RPC via alloy:
//! - `PairEventSource`: `eth_newFilter` / `eth_getFilterChanges` on the
//!   factory's `PairCreated` event
//! - `TokenMetadataSource`: ERC-20 `name()` and `symbol()` calls

mod client;

pub use client::{decode_pair_created, EvmChainClient, IERC20Metadata, IPairFactory};
