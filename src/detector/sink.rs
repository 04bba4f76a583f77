//! Progress reporting for the detector
//!
//! Detection logic never prints. It reports what it sees to an [`EventSink`];
//! `silent` detectors get a [`SilentSink`], everything else a [`TracingSink`].

use crate::types::TaggedEvent;
use tracing::{debug, info};

/// Observer for detector progress. Every method defaults to a no-op.
pub trait EventSink: Send + Sync {
    fn stream_started(&self, _tag: &str, _tag_hex: &str) {}

    fn block_received(&self, _number: u64, _transaction_count: usize) {}

    fn match_found(&self, _event: &TaggedEvent) {}

    fn transaction_dropped(&self, _tx_hash: &str, _reason: &str) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl EventSink for SilentSink {}

/// Reports through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn stream_started(&self, tag: &str, tag_hex: &str) {
        info!("Tag in hex: 0x{}", tag_hex);
        info!("Watching for transactions tagged '{}'", tag);
    }

    fn block_received(&self, number: u64, transaction_count: usize) {
        info!(
            "New block: {} (0x{:x}), {} transactions",
            number, number, transaction_count
        );
    }

    fn match_found(&self, event: &TaggedEvent) {
        info!(
            block = event.block_number,
            tx_hash = %event.tx_hash,
            from = %event.from,
            to = event.to.as_deref().unwrap_or("<contract creation>"),
            value = %format!("{} ETH", event.value),
            "Transaction with tag found"
        );
        info!("Data after tag hex: {}", event.data_hex);
        info!("Data after tag str: {}", event.data_str);
        info!("Parsed data: {:?}", event.parsed_data);
    }

    fn transaction_dropped(&self, tx_hash: &str, reason: &str) {
        debug!("Dropped tagged transaction {}: {}", tx_hash, reason);
    }
}
