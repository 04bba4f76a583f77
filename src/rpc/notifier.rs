//! New-block notifications by head polling
//!
//! Plain HTTP endpoints have no push subscription, so the notifier polls
//! `eth_blockNumber` and emits every block number between the last head it saw
//! and the new one. A head that moves backwards (reorg or a lagging backend)
//! is emitted again as a fresh notification; nothing is de-duplicated.

use crate::rpc::BlockSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Polls a [`BlockSource`] and feeds block numbers into a bounded channel
pub struct BlockNotifier {
    source: Arc<dyn BlockSource>,
    poll_interval: Duration,
    last_seen: Option<u64>,
}

impl BlockNotifier {
    pub fn new(source: Arc<dyn BlockSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
            last_seen: None,
        }
    }

    /// Treat `number` as already announced, so the first poll fills the gap after it
    pub fn resume_after(mut self, number: u64) -> Self {
        self.last_seen = Some(number);
        self
    }

    /// Block numbers to announce when the head moves to `head`
    fn advance(&mut self, head: u64) -> Vec<u64> {
        let numbers = match self.last_seen {
            None => vec![head],
            Some(last) if head > last => (last + 1..=head).collect(),
            Some(last) if head < last => {
                warn!("Head moved backwards from {} to {}, re-announcing", last, head);
                vec![head]
            }
            Some(_) => Vec::new(),
        };
        self.last_seen = Some(head);
        numbers
    }

    /// Poll until `shutdown` flips to true or the receiver goes away
    ///
    /// `send().await` on the bounded channel is the backpressure point: while
    /// the detector is busy, polling pauses.
    pub async fn run(mut self, sender: mpsc::Sender<u64>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Block notifier polling every {:?}", self.poll_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            // A head poll can spend several retries in the client; shutdown wins the race
            let head = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                polled = self.source.block_number() => match polled {
                    Ok(head) => head,
                    Err(e) => {
                        warn!("Failed to poll head block number: {}", e);
                        continue;
                    }
                },
            };

            for number in self.advance(head) {
                debug!("Announcing block {}", number);
                if sender.send(number).await.is_err() {
                    debug!("Block receiver dropped, stopping notifier");
                    return;
                }
            }
        }

        info!("Block notifier stopped");
    }
}
