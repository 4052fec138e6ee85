//! Price Fetcher
//!
//! One rate-limited, retry-aware price lookup per call.
//!
//! Admission goes through a counting gate `max_requests_per_minute / 30`
//! permits wide, and every admitted lookup waits a fixed delay before the
//! remote call. A 429 holds the permit for the server's `Retry-After` and
//! then retries the same address. Retries are unbounded unless
//! `max_throttle_retries` is set; there is no backoff growth.
//!
//! Every other failure (non-200 status, transport error, unusable payload)
//! is logged and reported as `None`. Nothing is raised to the caller.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::{parse_price_payload, parse_retry_after};
use crate::ports::PriceApi;

/// Requests per minute represented by one gate permit
pub const REQUESTS_PER_MINUTE_PER_PERMIT: u32 = 30;

/// Floor for the fixed pre-request delay
pub const MIN_REQUEST_DELAY: Duration = Duration::from_secs(2);

/// Runtime settings for the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    pub max_requests_per_minute: u32,
    /// Fixed sleep before every admitted request, at least `MIN_REQUEST_DELAY`
    pub request_delay: Duration,
    /// Wait used when a 429 carries no usable Retry-After
    pub default_retry_after: Duration,
    /// Consecutive 429s tolerated per lookup; `None` retries forever
    pub max_throttle_retries: Option<u32>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: 60,
            request_delay: MIN_REQUEST_DELAY,
            default_retry_after: Duration::from_secs(1),
            max_throttle_retries: None,
        }
    }
}

impl FetcherConfig {
    /// Concurrent lookups admitted by the gate (never less than one)
    pub fn gate_width(&self) -> usize {
        ((self.max_requests_per_minute / REQUESTS_PER_MINUTE_PER_PERMIT) as usize).max(1)
    }
}

/// Rate-gated price lookups against a `PriceApi`
#[derive(Debug)]
pub struct PriceFetcher<A> {
    api: A,
    gate: Arc<Semaphore>,
    config: FetcherConfig,
}

impl<A: PriceApi> PriceFetcher<A> {
    pub fn new(api: A, config: FetcherConfig) -> Self {
        let gate = Arc::new(Semaphore::new(config.gate_width()));
        Self { api, gate, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Permits currently free in the gate
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// Fetch the price of `address`, quantized to 18 fractional digits.
    ///
    /// `None` means unavailable for this attempt; `Some(0)` is a real zero.
    pub async fn get_token_price(&self, address: &str) -> Option<Decimal> {
        if address.is_empty() {
            warn!("Refusing price lookup for empty address");
            return None;
        }

        let mut throttled: u32 = 0;
        loop {
            let _permit = match self.gate.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Rate gate closed, skipping lookup for {}", address);
                    return None;
                }
            };

            tokio::time::sleep(self.config.request_delay.max(MIN_REQUEST_DELAY)).await;

            let response = match self.api.request_price(address).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Exception while fetching token price for {}: {}", address, e);
                    return None;
                }
            };

            if response.is_throttled() {
                throttled += 1;
                if let Some(max) = self.config.max_throttle_retries {
                    if throttled > max {
                        warn!(
                            "Rate limited {} times for {}, giving up this attempt",
                            throttled, address
                        );
                        return None;
                    }
                }

                let wait = parse_retry_after(
                    response.retry_after.as_deref(),
                    self.config.default_retry_after,
                );
                warn!("Rate limit reached. Retrying {} after {:?}", address, wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            if !response.is_ok() {
                warn!("Price API error for {}: {}, {}", address, response.status, response.body);
                return None;
            }

            let price = parse_price_payload(&response.body);
            match price {
                Some(p) => debug!("Price for {}: {}", address, p),
                None => debug!("No usable price in payload for {}", address),
            }
            return price;
        }
    }
}
