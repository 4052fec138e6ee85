//! Pricing service port
//!
//! The remote price API is modelled as a raw HTTP exchange: status code,
//! optional `Retry-After` header and body text. Interpreting the reply
//! (throttling, soft failures, payload shape) is the fetcher's job.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceApiError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// One HTTP reply from the pricing service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceApiResponse {
    pub status: u16,
    /// Raw `Retry-After` header, if the server sent one
    pub retry_after: Option<String>,
    pub body: String,
}

impl PriceApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, retry_after: impl Into<String>) -> Self {
        self.retry_after = Some(retry_after.into());
        self
    }

    pub fn is_throttled(&self) -> bool {
        self.status == 429
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait PriceApi: Send + Sync {
    /// Issue one price request for a token address
    async fn request_price(&self, address: &str) -> Result<PriceApiResponse, PriceApiError>;
}
