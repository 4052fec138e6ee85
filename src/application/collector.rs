//! Price Collection Queue
//!
//! Owns the backlog of discovered pairs and drains a bounded prefix of it
//! through the `PriceFetcher` once per cycle:
//!
//! 1. Pull everything enqueued since the last cycle onto the backlog tail.
//! 2. Take up to `batch_size` oldest records as the working batch.
//! 3. Fetch price0 then price1 for each record, sequentially.
//! 4. Records with both legs priced go to the sink in one batch call and
//!    leave the backlog for good; the rest go back to the tail un-priced.
//! 5. Records beyond the cap keep their place for the next cycle.
//!
//! Producers only hold a `CollectorHandle`, which feeds an unbounded
//! channel. The cycle only reads that channel at step 1, so records
//! enqueued mid-cycle are first considered on the following cycle.
//!
//! A record whose price can never be found is requeued forever and keeps
//! costing lookups every cycle. `max_attempts` turns on aging-out.

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::price_fetcher::PriceFetcher;
use crate::domain::PairRecord;
use crate::ports::{PairSink, PriceApi};

/// Hard upper bound on records priced per cycle (two lookups each)
pub const MAX_BATCH_SIZE: usize = 30;

pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_SIZE;

/// Sleep between drain cycles
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(180);

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Price collector is no longer running")]
    QueueClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Records per cycle, never more than `MAX_BATCH_SIZE`
    pub batch_size: usize,
    pub cycle_interval: Duration,
    /// Unpriced cycles after which a record is dropped; `None` keeps it forever
    pub max_attempts: Option<u32>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Producer side of the queue; cheap to clone
#[derive(Debug, Clone)]
pub struct CollectorHandle {
    tx: mpsc::UnboundedSender<PairRecord>,
}

impl CollectorHandle {
    /// Append a record to the backlog tail
    pub fn add_to_queue(&self, record: PairRecord) -> Result<(), CollectorError> {
        self.tx.send(record).map_err(|_| CollectorError::QueueClosed)
    }
}

/// Outcome of one drain cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records in the working batch
    pub processed: usize,
    /// Records sent to the sink
    pub emitted: usize,
    /// Records returned to the backlog tail
    pub requeued: usize,
    /// Records dropped by `max_attempts`
    pub aged_out: usize,
    /// Backlog length after the cycle
    pub pending: usize,
}

#[derive(Debug)]
struct PendingPair {
    record: PairRecord,
    failed_cycles: u32,
}

pub struct PriceCollector<A, S> {
    fetcher: PriceFetcher<A>,
    sink: S,
    config: CollectorConfig,
    tx: mpsc::UnboundedSender<PairRecord>,
    inbox: mpsc::UnboundedReceiver<PairRecord>,
    backlog: VecDeque<PendingPair>,
}

impl<A: PriceApi, S: PairSink> PriceCollector<A, S> {
    pub fn new(fetcher: PriceFetcher<A>, sink: S, config: CollectorConfig) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        Self {
            fetcher,
            sink,
            config,
            tx,
            inbox,
            backlog: VecDeque::new(),
        }
    }

    /// A new producer handle onto this queue
    pub fn handle(&self) -> CollectorHandle {
        CollectorHandle { tx: self.tx.clone() }
    }

    /// Records currently on the backlog (excludes not-yet-absorbed enqueues)
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Backlog records in processing order
    pub fn backlog(&self) -> impl Iterator<Item = &PairRecord> {
        self.backlog.iter().map(|p| &p.record)
    }

    /// Drain loop. Never returns.
    pub async fn run(mut self) {
        info!(
            "Starting price collector - batch size: {}, cycle interval: {:?}",
            self.config.batch_size, self.config.cycle_interval
        );

        loop {
            let report = self.run_cycle().await;
            info!(
                "Price cycle: processed {}, emitted {}, requeued {}, aged out {}, pending {}",
                report.processed, report.emitted, report.requeued, report.aged_out, report.pending
            );
            tokio::time::sleep(self.config.cycle_interval).await;
        }
    }

    /// Run one drain cycle without the trailing sleep
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.absorb_inbox();

        let take = self
            .config
            .batch_size
            .min(MAX_BATCH_SIZE)
            .min(self.backlog.len());
        let batch: Vec<PendingPair> = self.backlog.drain(..take).collect();

        let mut report = CycleReport {
            processed: batch.len(),
            ..CycleReport::default()
        };
        let mut priced = Vec::new();
        let mut requeue = Vec::new();

        for mut pending in batch {
            let price0 = self
                .fetcher
                .get_token_price(&pending.record.token0().address)
                .await;
            let price1 = self
                .fetcher
                .get_token_price(&pending.record.token1().address)
                .await;

            match (price0, price1) {
                (Some(p0), Some(p1)) => priced.push(pending.record.into_priced(p0, p1)),
                _ => {
                    pending.failed_cycles += 1;
                    if self.is_expired(&pending) {
                        warn!(
                            "Dropping {}/{} ({}) after {} unpriced cycles",
                            pending.record.token0().symbol,
                            pending.record.token1().symbol,
                            pending.record.tx_hash(),
                            pending.failed_cycles
                        );
                        report.aged_out += 1;
                    } else {
                        debug!(
                            "Price unavailable for {}/{}, requeueing",
                            pending.record.token0().symbol,
                            pending.record.token1().symbol
                        );
                        requeue.push(pending);
                    }
                }
            }
        }

        report.requeued = requeue.len();
        report.emitted = priced.len();
        self.backlog.extend(requeue);
        report.pending = self.backlog.len();

        if !priced.is_empty() {
            self.sink.display(&priced);
        }

        report
    }

    fn absorb_inbox(&mut self) {
        while let Ok(record) = self.inbox.try_recv() {
            self.backlog.push_back(PendingPair {
                record,
                failed_cycles: 0,
            });
        }
    }

    fn is_expired(&self, pending: &PendingPair) -> bool {
        self.config
            .max_attempts
            .is_some_and(|max| pending.failed_cycles >= max)
    }
}
