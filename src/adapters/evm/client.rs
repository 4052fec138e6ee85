//! EVM chain client
//!
//! One HTTP provider shared by the factory filter and token metadata calls.

use std::str::FromStr;

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, Log},
    sol,
    sol_types::SolEvent,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use tracing::warn;

use crate::domain::{PairCreatedEvent, TokenIdentity};
use crate::ports::{EventSourceError, MetadataError, PairEventSource, StartPosition, TokenMetadataSource};

sol! {
    interface IPairFactory {
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 allPairsLength);
    }

    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
    }
}

/// alloy-backed chain access for one factory
#[derive(Clone)]
pub struct EvmChainClient {
    provider: DynProvider,
    factory: Address,
}

impl EvmChainClient {
    /// Connect to an HTTP JSON-RPC endpoint and watch `factory_address`
    pub fn connect_http(rpc_url: &str, factory_address: &str) -> Result<Self, EventSourceError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| EventSourceError::Config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        let factory = Address::from_str(factory_address).map_err(|e| {
            EventSourceError::Config(format!("Invalid factory address '{}': {}", factory_address, e))
        })?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self { provider, factory })
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Log filter for the factory's PairCreated event
    pub fn pair_created_filter(&self, from: StartPosition) -> Filter {
        let from_block = match from {
            StartPosition::Latest => BlockNumberOrTag::Latest,
            StartPosition::Block(n) => BlockNumberOrTag::Number(n),
        };

        Filter::new()
            .address(self.factory)
            .event_signature(IPairFactory::PairCreated::SIGNATURE_HASH)
            .from_block(from_block)
    }
}

/// Decode a raw log into a pair-created event with checksummed addresses
pub fn decode_pair_created(log: &Log) -> Result<PairCreatedEvent, EventSourceError> {
    let decoded = log
        .log_decode::<IPairFactory::PairCreated>()
        .map_err(|e| EventSourceError::Decode(e.to_string()))?;
    let tx_hash = log
        .transaction_hash
        .ok_or_else(|| EventSourceError::Decode("log has no transaction hash".to_string()))?;

    let event = decoded.inner.data;
    Ok(PairCreatedEvent {
        token0: event.token0.to_checksum(None),
        token1: event.token1.to_checksum(None),
        tx_hash: tx_hash.to_string(),
    })
}

fn rpc_error(e: impl std::fmt::Display) -> EventSourceError {
    let message = e.to_string();
    if message.to_lowercase().contains("filter not found") {
        EventSourceError::FilterExpired
    } else {
        EventSourceError::Rpc(message)
    }
}

#[async_trait]
impl PairEventSource for EvmChainClient {
    type Filter = U256;

    async fn create_filter(&self, from: StartPosition) -> Result<U256, EventSourceError> {
        self.provider
            .new_filter(&self.pair_created_filter(from))
            .await
            .map_err(rpc_error)
    }

    async fn new_entries(&self, filter: &U256) -> Result<Vec<PairCreatedEvent>, EventSourceError> {
        let logs: Vec<Log> = self
            .provider
            .get_filter_changes(*filter)
            .await
            .map_err(rpc_error)?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            match decode_pair_created(log) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Ignoring undecodable factory log: {}", e),
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl TokenMetadataSource for EvmChainClient {
    async fn token_identity(&self, address: &str) -> Result<TokenIdentity, MetadataError> {
        let token = Address::from_str(address)
            .map_err(|_| MetadataError::InvalidAddress(address.to_string()))?;
        let contract = IERC20Metadata::new(token, self.provider.clone());

        let name = contract
            .name()
            .call()
            .await
            .map_err(|e| MetadataError::CallFailed {
                address: address.to_string(),
                call: "name",
                reason: e.to_string(),
            })?;
        let symbol = contract
            .symbol()
            .call()
            .await
            .map_err(|e| MetadataError::CallFailed {
                address: address.to_string(),
                call: "symbol",
                reason: e.to_string(),
            })?;

        Ok(TokenIdentity::new(name, symbol, address))
    }
}
