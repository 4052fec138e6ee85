//! Scripted port implementations for tests
//!
//! Deterministic stand-ins for the pricing API, the chain and the console.
//! They record every call so tests can assert on ordering and timing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::chain::{EventSourceError, MetadataError, PairEventSource, StartPosition, TokenMetadataSource};
use super::pricing::{PriceApi, PriceApiError, PriceApiResponse};
use super::sink::PairSink;
use crate::domain::{PairCreatedEvent, PairRecord, TokenIdentity};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A canned pricing-service reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// 200 with a well-formed success payload carrying this value
    Price(String),
    /// Arbitrary status and body
    Status { status: u16, retry_after: Option<String>, body: String },
    /// Connection-level failure
    TransportError,
}

impl ScriptedReply {
    pub fn price(value: &str) -> Self {
        ScriptedReply::Price(value.to_string())
    }

    pub fn throttled(retry_after: Option<&str>) -> Self {
        ScriptedReply::Status {
            status: 429,
            retry_after: retry_after.map(str::to_string),
            body: "Too Many Requests".to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        ScriptedReply::Status {
            status,
            retry_after: None,
            body: body.to_string(),
        }
    }

    fn into_response(self) -> Result<PriceApiResponse, PriceApiError> {
        match self {
            ScriptedReply::Price(value) => Ok(PriceApiResponse::new(
                200,
                format!(r#"{{"success":true,"data":{{"value":{}}}}}"#, value),
            )),
            ScriptedReply::Status { status, retry_after, body } => {
                let response = PriceApiResponse::new(status, body);
                Ok(match retry_after {
                    Some(value) => response.with_retry_after(value),
                    None => response,
                })
            }
            ScriptedReply::TransportError => {
                Err(PriceApiError::Transport("connection reset by peer".to_string()))
            }
        }
    }
}

#[derive(Debug, Default)]
struct PriceScript {
    queued: VecDeque<ScriptedReply>,
    fallback: Option<ScriptedReply>,
}

/// Pricing API that replays per-address scripts
///
/// Each address has a queue of one-shot replies followed by a sticky
/// fallback. Addresses with nothing scripted answer 404.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPriceApi {
    scripts: Arc<Mutex<HashMap<String, PriceScript>>>,
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
    latency: Duration,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl ScriptedPriceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request to `address` answers with this price
    pub fn with_price(self, address: &str, value: &str) -> Self {
        self.with_fallback(address, ScriptedReply::price(value))
    }

    /// Every request to `address` not covered by a queued reply gets `reply`
    pub fn with_fallback(self, address: &str, reply: ScriptedReply) -> Self {
        lock(&self.scripts).entry(address.to_lowercase()).or_default().fallback = Some(reply);
        self
    }

    /// Queue a one-shot reply for `address`
    pub fn with_reply(self, address: &str, reply: ScriptedReply) -> Self {
        lock(&self.scripts).entry(address.to_lowercase()).or_default().queued.push_back(reply);
        self
    }

    /// Simulated time each request spends in flight
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Change the sticky reply of an address after construction
    pub fn set_fallback(&self, address: &str, reply: ScriptedReply) {
        lock(&self.scripts).entry(address.to_lowercase()).or_default().fallback = Some(reply);
    }

    /// Addresses and instants of all requests, in order
    pub fn calls(&self) -> Vec<(String, Instant)> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_for(&self, address: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|(a, _)| a.eq_ignore_ascii_case(address))
            .count()
    }

    /// Highest number of requests observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, address: &str) -> ScriptedReply {
        let mut scripts = lock(&self.scripts);
        match scripts.get_mut(&address.to_lowercase()) {
            Some(script) => script
                .queued
                .pop_front()
                .or_else(|| script.fallback.clone())
                .unwrap_or_else(|| ScriptedReply::status(404, "not found")),
            None => ScriptedReply::status(404, "not found"),
        }
    }
}

#[async_trait]
impl PriceApi for ScriptedPriceApi {
    async fn request_price(&self, address: &str) -> Result<PriceApiResponse, PriceApiError> {
        lock(&self.calls).push((address.to_string(), Instant::now()));

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.next_reply(address).into_response()
    }
}

#[derive(Debug, Clone)]
enum ScriptedPoll {
    Events(Vec<PairCreatedEvent>),
    Failure(String),
    Expired,
}

/// Event source that hands out pre-loaded batches, one per poll
#[derive(Debug, Clone, Default)]
pub struct ScriptedEventSource {
    batches: Arc<Mutex<VecDeque<ScriptedPoll>>>,
    filters_created: Arc<AtomicU64>,
    polls: Arc<AtomicU64>,
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(self, events: Vec<PairCreatedEvent>) -> Self {
        lock(&self.batches).push_back(ScriptedPoll::Events(events));
        self
    }

    /// Queue a failing poll
    pub fn with_failure(self, reason: &str) -> Self {
        lock(&self.batches).push_back(ScriptedPoll::Failure(reason.to_string()));
        self
    }

    /// Queue a poll reporting that the node dropped the filter
    pub fn with_expired_filter(self) -> Self {
        lock(&self.batches).push_back(ScriptedPoll::Expired);
        self
    }

    pub fn filters_created(&self) -> u64 {
        self.filters_created.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PairEventSource for ScriptedEventSource {
    type Filter = u64;

    async fn create_filter(&self, _from: StartPosition) -> Result<u64, EventSourceError> {
        Ok(self.filters_created.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn new_entries(&self, _filter: &u64) -> Result<Vec<PairCreatedEvent>, EventSourceError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.batches).pop_front() {
            Some(ScriptedPoll::Events(events)) => Ok(events),
            Some(ScriptedPoll::Failure(reason)) => Err(EventSourceError::Rpc(reason)),
            Some(ScriptedPoll::Expired) => Err(EventSourceError::FilterExpired),
            None => Ok(Vec::new()),
        }
    }
}

/// Token metadata backed by a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticTokenMetadata {
    tokens: HashMap<String, (String, String)>,
}

impl StaticTokenMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, address: &str, name: &str, symbol: &str) -> Self {
        self.tokens
            .insert(address.to_lowercase(), (name.to_string(), symbol.to_string()));
        self
    }
}

#[async_trait]
impl TokenMetadataSource for StaticTokenMetadata {
    async fn token_identity(&self, address: &str) -> Result<TokenIdentity, MetadataError> {
        self.tokens
            .get(&address.to_lowercase())
            .map(|(name, symbol)| TokenIdentity::new(name.clone(), symbol.clone(), address))
            .ok_or_else(|| MetadataError::CallFailed {
                address: address.to_string(),
                call: "name",
                reason: "execution reverted".to_string(),
            })
    }
}

/// Sink that keeps every emitted batch
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<Vec<PairRecord>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<PairRecord>> {
        lock(&self.batches).clone()
    }

    /// All emitted records, flattened in emission order
    pub fn emitted(&self) -> Vec<PairRecord> {
        lock(&self.batches).iter().flatten().cloned().collect()
    }
}

impl PairSink for RecordingSink {
    fn display(&self, pairs: &[PairRecord]) {
        lock(&self.batches).push(pairs.to_vec());
    }
}
