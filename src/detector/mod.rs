//! Block detector
//!
//! Watches new blocks for transactions whose input carries `marker ‖ tag`,
//! filters them, and hands a [`TaggedEvent`] per surviving transaction to a
//! callback.
//!
//! Lifecycle: a [`Detector`] is idle until [`Detector::start`] (or
//! [`Detector::start_with_notifications`]) consumes it and returns a
//! [`DetectorHandle`] for the streaming state. Block numbers pass through a
//! bounded queue into a single processing task, so blocks are handled one at a
//! time in arrival order and transactions in block order.
//!
//! Transport failures for a block are retried by the RPC client; once retries
//! are exhausted the block is logged and skipped and streaming continues.

pub mod filter;
pub mod sink;

pub use filter::{Filter, FilterChain, Predicate};
pub use sink::{EventSink, SilentSink, TracingSink};

use crate::codec::{decode_payload, locate_marker, normalise_hex, parse_payload, tag_to_hex};
use crate::config::DetectorConfig;
use crate::errors::{CodecResult, RpcResult};
use crate::rpc::{BlockNotifier, BlockSource};
use crate::types::{Block, ChainTransaction, TaggedEvent};
use crate::utils::currency::wei_to_ether;
use futures::stream::{self, StreamExt};
use std::ops::RangeInclusive;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Scans blocks for one tag
pub struct Detector {
    source: Arc<dyn BlockSource>,
    tag: String,
    tag_hex: String,
    data_keys: Vec<String>,
    filters: FilterChain,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
    queue_capacity: usize,
    resume_after: Option<u64>,
}

impl Detector {
    /// Detector with default polling and queueing
    pub fn new(
        source: Arc<dyn BlockSource>,
        tag: &str,
        data_keys: Vec<String>,
        silent: bool,
    ) -> Self {
        Self::builder(source, tag)
            .data_keys(data_keys)
            .silent(silent)
            .build()
    }

    pub fn builder(source: Arc<dyn BlockSource>, tag: &str) -> DetectorBuilder {
        DetectorBuilder::new(source, tag)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn tag_hex(&self) -> &str {
        &self.tag_hex
    }

    pub fn data_keys(&self) -> &[String] {
        &self.data_keys
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Append a predicate to the filter list
    pub fn add_filter<F>(&mut self, predicate: F)
    where
        F: Fn(&ChainTransaction, &str) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Filter::predicate(predicate));
    }

    /// Require the parsed payload to contain `key`
    pub fn add_tag_key_filter(&mut self, key: impl Into<String>) {
        self.filters.push(Filter::HasKey(key.into()));
    }

    /// Check one transaction; `None` when it carries no tag or is filtered out
    pub fn scan_transaction(&self, tx: &ChainTransaction, block: &Block) -> Option<TaggedEvent> {
        let input_hex = hex::encode(&tx.input);
        let offset = locate_marker(&input_hex, &self.tag_hex)?;
        let tx_hash = tx.hash.to_string();

        // A match at an odd nibble leaves a payload that cannot decode
        let payload_hex = &input_hex[offset..];
        let payload = match decode_payload(payload_hex) {
            Ok(payload) => payload,
            Err(e) => {
                self.sink.transaction_dropped(&tx_hash, &e.to_string());
                return None;
            }
        };

        let accepted = catch_unwind(AssertUnwindSafe(|| {
            self.filters.accepts(tx, &payload, &self.data_keys)
        }));
        match accepted {
            Ok(true) => {}
            Ok(false) => {
                debug!("Transaction {} rejected by filters", tx_hash);
                return None;
            }
            Err(_) => {
                warn!("Filter panicked on transaction {}, dropping it", tx_hash);
                return None;
            }
        }

        Some(TaggedEvent {
            block_number: block.number,
            tx_hash,
            from: tx.from.to_string(),
            to: tx.to.map(|to| to.to_string()),
            value: wei_to_ether(tx.value),
            timestamp: block.timestamp,
            data_hex: format!("0x{}", payload_hex),
            parsed_data: parse_payload(&payload, &self.data_keys),
            data_str: payload,
        })
    }

    /// All events in a block, in transaction order
    pub fn scan_block(&self, block: &Block) -> Vec<TaggedEvent> {
        block
            .transactions
            .iter()
            .filter_map(|tx| self.scan_transaction(tx, block))
            .collect()
    }

    /// Fetch a block, scan it, and invoke `callback` per event
    ///
    /// Returns the number of events emitted.
    pub async fn process_block<C>(&self, number: u64, callback: &mut C) -> RpcResult<usize>
    where
        C: FnMut(TaggedEvent),
    {
        let block = self.source.get_block_by_number(number).await?;
        Ok(self.deliver(&block, callback))
    }

    fn deliver<C>(&self, block: &Block, callback: &mut C) -> usize
    where
        C: FnMut(TaggedEvent),
    {
        self.sink.block_received(block.number, block.transactions.len());

        let events = self.scan_block(block);
        let emitted = events.len();
        for event in events {
            self.sink.match_found(&event);
            let tx_hash = event.tx_hash.clone();
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!("Callback panicked while handling transaction {}", tx_hash);
            }
        }
        emitted
    }

    /// Make [`Detector::start`] continue from the block after `number`
    ///
    /// Without this the first poll announces only the current head.
    pub fn resume_after(&mut self, number: u64) {
        self.resume_after = Some(number);
    }

    /// Scan a historical block range, in order, before or instead of streaming
    ///
    /// Up to `concurrency` blocks are fetched at once but events are delivered
    /// in block order. Blocks that cannot be fetched are logged and skipped.
    /// Returns the number of events emitted.
    pub async fn scan_range<C>(
        &self,
        range: RangeInclusive<u64>,
        concurrency: usize,
        callback: &mut C,
    ) -> usize
    where
        C: FnMut(TaggedEvent),
    {
        let source = &self.source;
        let mut blocks = stream::iter(range)
            .map(|number| async move { (number, source.get_block_by_number(number).await) })
            .buffered(concurrency.max(1));

        let mut emitted = 0;
        while let Some((number, result)) = blocks.next().await {
            match result {
                Ok(block) => emitted += self.deliver(&block, callback),
                Err(e) => error!("Skipping block {}: {}", number, e),
            }
        }
        emitted
    }

    /// Start streaming from the bundled head-polling notifier
    pub fn start<C>(self, callback: C) -> DetectorHandle
    where
        C: FnMut(TaggedEvent) + Send + 'static,
    {
        let (block_tx, block_rx) = mpsc::channel(self.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut notifier = BlockNotifier::new(Arc::clone(&self.source), self.poll_interval);
        if let Some(number) = self.resume_after {
            notifier = notifier.resume_after(number);
        }
        let notifier_task = tokio::spawn(notifier.run(block_tx, shutdown_rx.clone()));
        let processor = tokio::spawn(self.run(block_rx, shutdown_rx, callback));

        DetectorHandle {
            shutdown: shutdown_tx,
            processor,
            notifier: Some(notifier_task),
        }
    }

    /// Start streaming from a caller-owned notification source
    ///
    /// Processing ends when `blocks` closes or the handle is stopped.
    pub fn start_with_notifications<C>(
        self,
        blocks: mpsc::Receiver<u64>,
        callback: C,
    ) -> DetectorHandle
    where
        C: FnMut(TaggedEvent) + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let processor = tokio::spawn(self.run(blocks, shutdown_rx, callback));

        DetectorHandle {
            shutdown: shutdown_tx,
            processor,
            notifier: None,
        }
    }

    async fn run<C>(
        self,
        mut blocks: mpsc::Receiver<u64>,
        mut shutdown: watch::Receiver<bool>,
        mut callback: C,
    ) where
        C: FnMut(TaggedEvent) + Send + 'static,
    {
        self.sink.stream_started(&self.tag, &self.tag_hex);

        loop {
            let number = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                next = blocks.recv() => match next {
                    Some(number) => number,
                    None => break,
                },
            };

            match self.process_block(number, &mut callback).await {
                Ok(emitted) => debug!("Block {} produced {} tagged events", number, emitted),
                Err(e) => error!("Skipping block {}: {}", number, e),
            }
        }

        debug!("Detector for tag '{}' stopped", self.tag);
    }
}

/// Builder for [`Detector`]
pub struct DetectorBuilder {
    source: Arc<dyn BlockSource>,
    tag: String,
    tag_hex: String,
    data_keys: Vec<String>,
    silent: bool,
    sink: Option<Arc<dyn EventSink>>,
    filters: FilterChain,
    poll_interval: Duration,
    queue_capacity: usize,
}

impl DetectorBuilder {
    pub fn new(source: Arc<dyn BlockSource>, tag: &str) -> Self {
        Self {
            source,
            tag: tag.to_string(),
            tag_hex: tag_to_hex(tag),
            data_keys: Vec::new(),
            silent: false,
            sink: None,
            filters: FilterChain::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Builder seeded from configuration (tag, keys, silent, polling, queue)
    pub fn from_config(source: Arc<dyn BlockSource>, config: &DetectorConfig) -> Self {
        Self::new(source, &config.tag)
            .data_keys(config.data_keys.clone())
            .silent(config.silent)
            .poll_interval(Duration::from_millis(config.poll_interval_ms))
            .queue_capacity(config.queue_capacity)
    }

    /// Match a tag given as hex, e.g. a content digest that is not valid UTF-8
    ///
    /// Replaces the text tag; the detector reports it as `0x<hex>`.
    pub fn hex_tag(mut self, tag_hex: &str) -> CodecResult<Self> {
        self.tag_hex = normalise_hex(tag_hex)?;
        self.tag = format!("0x{}", self.tag_hex);
        Ok(self)
    }

    pub fn data_keys(mut self, data_keys: Vec<String>) -> Self {
        self.data_keys = data_keys;
        self
    }

    /// Use [`SilentSink`] unless an explicit sink is set
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ChainTransaction, &str) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Filter::predicate(predicate));
        self
    }

    pub fn tag_key_filter(mut self, key: impl Into<String>) -> Self {
        self.filters.push(Filter::HasKey(key.into()));
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity.max(1);
        self
    }

    pub fn build(self) -> Detector {
        let sink = match (self.sink, self.silent) {
            (Some(sink), _) => sink,
            (None, true) => Arc::new(SilentSink) as Arc<dyn EventSink>,
            (None, false) => Arc::new(TracingSink) as Arc<dyn EventSink>,
        };

        Detector {
            source: self.source,
            tag: self.tag,
            tag_hex: self.tag_hex,
            data_keys: self.data_keys,
            filters: self.filters,
            sink,
            poll_interval: self.poll_interval,
            queue_capacity: self.queue_capacity,
            resume_after: None,
        }
    }
}

/// Streaming-state handle returned by `start`
///
/// Dropping the handle closes the shutdown channel, which stops streaming.
#[must_use = "dropping the handle stops the detector"]
pub struct DetectorHandle {
    shutdown: watch::Sender<bool>,
    processor: JoinHandle<()>,
    notifier: Option<JoinHandle<()>>,
}

impl DetectorHandle {
    /// Stop polling and processing; the block in flight finishes first
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        self.join().await;
    }

    /// Wait for processing to end on its own (notification source closed)
    pub async fn join(self) {
        if let Err(e) = self.processor.await {
            error!("Detector task failed: {}", e);
        }
        if let Some(notifier) = self.notifier {
            // The notifier exits once the processor drops its receiver
            let _ = self.shutdown.send(true);
            if let Err(e) = notifier.await {
                error!("Block notifier task failed: {}", e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.processor.is_finished()
    }
}
