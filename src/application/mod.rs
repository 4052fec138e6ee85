//! Application Layer
//!
//! The two long-running loops and the rate-limited lookup they share:
//! - `watcher`: discovers pairs and enqueues them
//! - `collector`: drains the backlog through the fetcher into the sink
//! - `price_fetcher`: gated, retrying price lookups

pub mod collector;
pub mod price_fetcher;
pub mod watcher;

pub use collector::{
    CollectorConfig, CollectorError, CollectorHandle, CycleReport, PriceCollector,
    DEFAULT_BATCH_SIZE, DEFAULT_CYCLE_INTERVAL, MAX_BATCH_SIZE,
};
pub use price_fetcher::{FetcherConfig, PriceFetcher, MIN_REQUEST_DELAY, REQUESTS_PER_MINUTE_PER_PERMIT};
pub use watcher::{PairWatcher, PollSummary, WatcherError, DEFAULT_POLL_INTERVAL, FILTER_RESET_AFTER_FAILURES};
