//! Pipeline Integration Tests
//!
//! Wires the pair watcher to the price collector through scripted chain and
//! pricing ports and checks what reaches the output:
//! 1. A reference pair discovered, priced on both legs and printed once
//! 2. A pair whose second leg is unpriceable stays queued and is refetched whole
//! 3. Both loops running together on a paused clock
//!
//! All tests are deterministic (no real network calls).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use rust_decimal_macros::dec;

use pairwatch::adapters::console::{format_pair_line, DEFAULT_EXPLORER_TX_URL};
use pairwatch::application::{
    CollectorConfig, FetcherConfig, PairWatcher, PriceCollector, PriceFetcher,
};
use pairwatch::domain::{PairCreatedEvent, PairRecord};
use pairwatch::ports::mocks::{
    RecordingSink, ScriptedEventSource, ScriptedPriceApi, ScriptedReply, StaticTokenMetadata,
};
use pairwatch::ports::{PairEventSource, PairSink, StartPosition};

// ============================================================================
// Test Fixtures
// ============================================================================

const REF: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";
const TOKEN_A: &str = "0xAaAa000000000000000000000000000000000001";
const TX: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

/// Sink that renders every pair the way the console printer does
#[derive(Clone, Default)]
struct LineSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LineSink {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl PairSink for LineSink {
    fn display(&self, pairs: &[PairRecord]) {
        let now = Local::now();
        let mut lines = self.lines.lock().unwrap();
        for pair in pairs {
            let prices = pair.prices().expect("sink only receives priced pairs");
            lines.push(format_pair_line(pair, prices, DEFAULT_EXPLORER_TX_URL, now));
        }
    }
}

fn new_pair_event() -> PairCreatedEvent {
    PairCreatedEvent {
        token0: TOKEN_A.to_string(),
        token1: REF.to_string(),
        tx_hash: TX.to_string(),
    }
}

fn metadata() -> StaticTokenMetadata {
    StaticTokenMetadata::new()
        .with_token(TOKEN_A, "Foo", "FOO")
        .with_token(REF, "Wrapped BNB", "WBNB")
}

fn collector<S: PairSink>(api: ScriptedPriceApi, sink: S) -> PriceCollector<ScriptedPriceApi, S> {
    PriceCollector::new(
        PriceFetcher::new(api, FetcherConfig::default()),
        sink,
        CollectorConfig::default(),
    )
}

// ============================================================================
// Discovery -> Pricing -> Display
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_discovered_pair_is_priced_and_printed_once() {
    let source = ScriptedEventSource::new().with_batch(vec![new_pair_event()]);
    let api = ScriptedPriceApi::new()
        .with_price(TOKEN_A, "0.000123456789012345")
        .with_price(REF, "1.0");
    let sink = LineSink::default();

    let mut collector = collector(api.clone(), sink.clone());
    let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

    let filter = source.create_filter(StartPosition::Latest).await.unwrap();
    let summary = watcher.poll_once(&filter).await.unwrap();
    assert_eq!(summary.enqueued, 1);

    let report = collector.run_cycle().await;
    assert_eq!(report.emitted, 1);
    assert_eq!(report.pending, 0);
    assert_eq!(collector.backlog_len(), 0);

    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert!(line.contains("Foo"));
    assert!(line.contains("FOO"));
    assert!(line.contains(TOKEN_A));
    assert!(line.contains(REF));
    assert!(line.contains(TX));
    assert!(line.contains("0.000123456789012345"));
    assert!(line.contains("1.000000000000000000"));

    // nothing left to price on the next cycle
    collector.run_cycle().await;
    assert_eq!(sink.lines().len(), 1);
    assert_eq!(api.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_leg_keeps_pair_and_refetches_both() {
    let source = ScriptedEventSource::new().with_batch(vec![new_pair_event()]);
    let api = ScriptedPriceApi::new()
        .with_price(TOKEN_A, "0.000123456789012345")
        .with_fallback(REF, ScriptedReply::status(503, "upstream unavailable"));
    let sink = RecordingSink::new();

    let mut collector = collector(api.clone(), sink.clone());
    let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

    let filter = source.create_filter(StartPosition::Latest).await.unwrap();
    watcher.poll_once(&filter).await.unwrap();

    let report = collector.run_cycle().await;
    assert_eq!(report.emitted, 0);
    assert_eq!(report.requeued, 1);
    assert!(sink.batches().is_empty());
    assert_eq!(collector.backlog_len(), 1);
    assert!(!collector.backlog().next().unwrap().is_priced());

    api.set_fallback(REF, ScriptedReply::price("1.0"));
    let report = collector.run_cycle().await;
    assert_eq!(report.emitted, 1);

    // the first cycle's price for A was not kept, so A was asked twice
    assert_eq!(api.calls_for(TOKEN_A), 2);
    assert_eq!(api.calls_for(REF), 2);

    let emitted = sink.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].price0(), Some(dec!(0.000123456789012345)));
    assert_eq!(emitted[0].price1(), Some(dec!(1)));
    assert_eq!(collector.backlog_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_pair_never_reaches_pricing() {
    let other = PairCreatedEvent {
        token0: TOKEN_A.to_string(),
        token1: "0xCcCc000000000000000000000000000000000003".to_string(),
        tx_hash: TX.to_string(),
    };
    let source = ScriptedEventSource::new().with_batch(vec![other]);
    let api = ScriptedPriceApi::new();
    let sink = RecordingSink::new();

    let mut collector = collector(api.clone(), sink.clone());
    let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

    let filter = source.create_filter(StartPosition::Latest).await.unwrap();
    let summary = watcher.poll_once(&filter).await.unwrap();
    assert_eq!(summary.ignored, 1);

    let report = collector.run_cycle().await;
    assert_eq!(report.processed, 0);
    assert_eq!(api.call_count(), 0);
}

// ============================================================================
// Both Loops Together
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_watcher_and_collector_loops_cooperate() {
    let source = ScriptedEventSource::new().with_batch(vec![new_pair_event()]);
    let api = ScriptedPriceApi::new()
        .with_price(TOKEN_A, "0.5")
        .with_price(REF, "600");
    let sink = RecordingSink::new();

    let collector = collector(api.clone(), sink.clone());
    let watcher = PairWatcher::new(source.clone(), metadata(), collector.handle(), REF);

    // one full collector interval plus room for the second cycle's lookups
    let _ = tokio::time::timeout(Duration::from_secs(200), async {
        tokio::select! {
            _ = collector.run() => {}
            _ = watcher.run() => {}
        }
    })
    .await;

    let emitted = sink.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].tx_hash(), TX);
    assert_eq!(emitted[0].token0().symbol, "FOO");
    assert_eq!(emitted[0].price1(), Some(dec!(600)));
    assert!(source.polls() > 100);
}
