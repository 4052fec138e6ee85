//! Pair Discovery Watcher
//!
//! Polls the factory's pair-created filter, keeps only pairs that include
//! the reference token, names both legs and hands them to the price queue.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::collector::{CollectorError, CollectorHandle};
use crate::domain::{PairCreatedEvent, PairRecord};
use crate::ports::{EventSourceError, MetadataError, PairEventSource, StartPosition, TokenMetadataSource};

/// Idle time between filter polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Consecutive failed polls before the filter is installed again
pub const FILTER_RESET_AFTER_FAILURES: u32 = 5;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Event source error: {0}")]
    EventSource(#[from] EventSourceError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Queue error: {0}")]
    Queue(#[from] CollectorError),
}

/// Result of handling one poll's worth of events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub received: usize,
    pub enqueued: usize,
    /// Events without the reference token
    pub ignored: usize,
    /// Relevant events whose token metadata could not be resolved
    pub skipped: usize,
}

pub struct PairWatcher<E, M> {
    source: E,
    metadata: M,
    queue: CollectorHandle,
    reference_token: String,
    poll_interval: Duration,
}

impl<E: PairEventSource, M: TokenMetadataSource> PairWatcher<E, M> {
    pub fn new(source: E, metadata: M, queue: CollectorHandle, reference_token: impl Into<String>) -> Self {
        Self {
            source,
            metadata,
            queue,
            reference_token: reference_token.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set custom poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn reference_token(&self) -> &str {
        &self.reference_token
    }

    /// Poll loop. Returns only if the price queue has gone away.
    pub async fn run(&self) -> Result<(), WatcherError> {
        info!(
            "Watching for new pairs against {} (poll interval {:?})",
            self.reference_token, self.poll_interval
        );

        let mut filter: Option<E::Filter> = None;
        let mut failures: u32 = 0;

        loop {
            if filter.is_none() {
                match self.source.create_filter(StartPosition::Latest).await {
                    Ok(f) => {
                        debug!("Pair-created filter installed");
                        filter = Some(f);
                        failures = 0;
                    }
                    Err(e) => warn!("Failed to install pair-created filter: {}", e),
                }
            }

            if let Some(active) = filter.as_ref() {
                match self.poll_once(active).await {
                    Ok(summary) => {
                        failures = 0;
                        if summary.received > 0 {
                            debug!(
                                "Poll: {} events, {} enqueued, {} ignored, {} skipped",
                                summary.received, summary.enqueued, summary.ignored, summary.skipped
                            );
                        }
                    }
                    Err(WatcherError::Queue(e)) => return Err(WatcherError::Queue(e)),
                    Err(WatcherError::EventSource(EventSourceError::FilterExpired)) => {
                        warn!("Pair-created filter expired, re-creating at latest block");
                        filter = None;
                        failures = 0;
                    }
                    Err(e) => {
                        failures += 1;
                        warn!("Failed to poll new pairs ({} in a row): {}", failures, e);
                        if failures >= FILTER_RESET_AFTER_FAILURES {
                            warn!("Re-creating pair-created filter at latest block");
                            filter = None;
                        }
                    }
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetch new entries once and enqueue the relevant ones
    pub async fn poll_once(&self, filter: &E::Filter) -> Result<PollSummary, WatcherError> {
        let events = self.source.new_entries(filter).await?;
        let mut summary = PollSummary {
            received: events.len(),
            ..PollSummary::default()
        };

        for event in events {
            if !event.involves(&self.reference_token) {
                summary.ignored += 1;
                continue;
            }

            match self.resolve(&event).await {
                Ok(record) => {
                    info!(
                        "Added new token. {} ({}) / {} ({}) tx {}",
                        record.token0().name,
                        record.token0().symbol,
                        record.token1().name,
                        record.token1().symbol,
                        record.tx_hash()
                    );
                    self.queue.add_to_queue(record)?;
                    summary.enqueued += 1;
                }
                Err(e) => {
                    warn!("Skipping pair from tx {}: {}", event.tx_hash, e);
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn resolve(&self, event: &PairCreatedEvent) -> Result<PairRecord, MetadataError> {
        let token0 = self.metadata.token_identity(&event.token0).await?;
        let token1 = self.metadata.token_identity(&event.token1).await?;
        Ok(PairRecord::new(token0, token1, event.tx_hash.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::collector::{CollectorConfig, PriceCollector};
    use crate::application::price_fetcher::{FetcherConfig, PriceFetcher};
    use crate::domain::TokenIdentity;
    use crate::ports::chain::MockTokenMetadataSource;
    use crate::ports::mocks::{RecordingSink, ScriptedEventSource, ScriptedPriceApi, StaticTokenMetadata};

    const REF: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";
    const FOO: &str = "0xAaAa000000000000000000000000000000000001";
    const BAR: &str = "0xBbBb000000000000000000000000000000000002";

    fn event(token0: &str, token1: &str, tx: &str) -> PairCreatedEvent {
        PairCreatedEvent {
            token0: token0.to_string(),
            token1: token1.to_string(),
            tx_hash: tx.to_string(),
        }
    }

    fn queue() -> PriceCollector<ScriptedPriceApi, RecordingSink> {
        PriceCollector::new(
            PriceFetcher::new(ScriptedPriceApi::new(), FetcherConfig::default()),
            RecordingSink::new(),
            CollectorConfig::default(),
        )
    }

    fn metadata() -> StaticTokenMetadata {
        StaticTokenMetadata::new()
            .with_token(FOO, "Foo", "FOO")
            .with_token(BAR, "Bar", "BAR")
            .with_token(REF, "Wrapped BNB", "WBNB")
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_reference_pairs_are_enqueued() {
        let source = ScriptedEventSource::new().with_batch(vec![
            event(FOO, REF, "0x01"),
            event(FOO, BAR, "0x02"),
            event(&REF.to_lowercase(), BAR, "0x03"),
        ]);
        let mut collector = queue();
        let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

        let filter = source.create_filter(StartPosition::Latest).await.unwrap();
        let summary = watcher.poll_once(&filter).await.unwrap();

        assert_eq!(
            summary,
            PollSummary {
                received: 3,
                enqueued: 2,
                ignored: 1,
                skipped: 0
            }
        );

        // nothing is priceable, so one cycle moves the inbox onto the backlog untouched
        collector.run_cycle().await;
        let txs: Vec<&str> = collector.backlog().map(|r| r.tx_hash()).collect();
        assert_eq!(txs, vec!["0x01", "0x03"]);

        let first = collector.backlog().next().unwrap();
        assert_eq!(first.token0(), &TokenIdentity::new("Foo", "FOO", FOO));
        assert_eq!(first.token1().symbol, "WBNB");
    }

    #[tokio::test]
    async fn test_metadata_failure_skips_event() {
        let source = ScriptedEventSource::new().with_batch(vec![event(FOO, REF, "0x01")]);

        let mut metadata = MockTokenMetadataSource::new();
        metadata
            .expect_token_identity()
            .withf(|address: &str| address == FOO)
            .times(1)
            .returning(|address: &str| {
                Err(MetadataError::CallFailed {
                    address: address.to_string(),
                    call: "symbol",
                    reason: "execution reverted".to_string(),
                })
            });

        let collector = queue();
        let watcher = PairWatcher::new(source.clone(), metadata, collector.handle(), REF);
        let filter = source.create_filter(StartPosition::Latest).await.unwrap();

        let summary = watcher.poll_once(&filter).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.enqueued, 0);
    }

    #[tokio::test]
    async fn test_metadata_resolved_for_both_legs() {
        let source = ScriptedEventSource::new().with_batch(vec![event(FOO, REF, "0x01")]);

        let mut metadata = MockTokenMetadataSource::new();
        metadata
            .expect_token_identity()
            .times(2)
            .returning(|address: &str| Ok(TokenIdentity::new("Name", "SYM", address)));

        let collector = queue();
        let watcher = PairWatcher::new(source.clone(), metadata, collector.handle(), REF);
        let filter = source.create_filter(StartPosition::Latest).await.unwrap();

        let summary = watcher.poll_once(&filter).await.unwrap();
        assert_eq!(summary.enqueued, 1);
    }

    #[tokio::test]
    async fn test_poll_error_propagates_from_poll_once() {
        let source = ScriptedEventSource::new().with_failure("filter not found");
        let collector = queue();
        let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);
        let filter = source.create_filter(StartPosition::Latest).await.unwrap();

        let result = watcher.poll_once(&filter).await;
        assert!(matches!(result, Err(WatcherError::EventSource(_))));
    }

    #[tokio::test]
    async fn test_closed_queue_is_reported() {
        let source = ScriptedEventSource::new().with_batch(vec![event(FOO, REF, "0x01")]);
        let collector = queue();
        let handle = collector.handle();
        drop(collector);

        let watcher = PairWatcher::new(source.clone(), metadata(), handle, REF);
        let filter = source.create_filter(StartPosition::Latest).await.unwrap();

        let result = watcher.poll_once(&filter).await;
        assert!(matches!(result, Err(WatcherError::Queue(CollectorError::QueueClosed))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recreates_filter_after_repeated_failures() {
        let mut source = ScriptedEventSource::new();
        for _ in 0..FILTER_RESET_AFTER_FAILURES {
            source = source.with_failure("filter not found");
        }
        let source = source.with_batch(vec![event(FOO, REF, "0x01")]);

        let collector = queue();
        let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

        let _ = tokio::time::timeout(Duration::from_secs(10), watcher.run()).await;

        assert_eq!(source.filters_created(), 2);
        assert!(source.polls() >= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recreates_expired_filter_immediately() {
        let source = ScriptedEventSource::new()
            .with_expired_filter()
            .with_batch(vec![event(FOO, REF, "0x01")]);

        let collector = queue();
        let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

        let _ = tokio::time::timeout(Duration::from_millis(2500), watcher.run()).await;

        assert_eq!(source.filters_created(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_when_queue_is_gone() {
        let source = ScriptedEventSource::new().with_batch(vec![event(FOO, REF, "0x01")]);
        let collector = queue();
        let handle = collector.handle();
        drop(collector);

        let watcher = PairWatcher::new(source, metadata(), handle, REF);
        let result = watcher.run().await;
        assert!(matches!(result, Err(WatcherError::Queue(_))));
    }
}
