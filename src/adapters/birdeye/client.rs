//! Birdeye API Client
//!
//! HTTP client for the Birdeye token price endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::Client;

use crate::ports::{PriceApi, PriceApiError, PriceApiResponse};

/// Birdeye API client configuration
#[derive(Debug, Clone)]
pub struct BirdeyeConfig {
    /// Base URL for the Birdeye public API
    pub api_base_url: String,
    /// API key sent as X-API-KEY
    pub api_key: String,
    /// Network tag sent as x-chain
    pub chain: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BirdeyeConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://public-api.birdeye.so".to_string(),
            api_key: String::new(),
            chain: "bsc".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl BirdeyeConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

/// Birdeye price client
#[derive(Debug, Clone)]
pub struct BirdeyeClient {
    config: BirdeyeConfig,
    http: Client,
}

impl BirdeyeClient {
    pub fn new(config: BirdeyeConfig) -> Result<Self, PriceApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PriceApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Full URL of the price endpoint
    pub fn price_url(&self) -> String {
        format!("{}/defi/price", self.config.api_base_url.trim_end_matches('/'))
    }

    pub fn chain(&self) -> &str {
        &self.config.chain
    }
}

#[async_trait]
impl PriceApi for BirdeyeClient {
    async fn request_price(&self, address: &str) -> Result<PriceApiResponse, PriceApiError> {
        let response = self
            .http
            .get(self.price_url())
            .query(&[("address", address)])
            .header(ACCEPT, "application/json")
            .header("x-chain", &self.config.chain)
            .header("X-API-KEY", &self.config.api_key)
            .send()
            .await
            .map_err(|e| PriceApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| PriceApiError::Body(e.to_string()))?;

        Ok(PriceApiResponse {
            status,
            retry_after,
            body,
        })
    }
}
