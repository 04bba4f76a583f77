//! In-memory chain implementing both RPC seams
//!
//! Every `send_transaction` mines a one-transaction block on top of the
//! current head, so a sender and a detector can share one instance.

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use ghosttag::errors::{RpcError, RpcResult};
use ghosttag::rpc::{BlockSource, TransactionSender};
use ghosttag::types::{Block, ChainTransaction, TransactionReceipt, TransactionRequest};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{fixture_sender, FIXTURE_TIMESTAMP};

#[derive(Default)]
pub struct MockChain {
    blocks: Mutex<BTreeMap<u64, Block>>,
    sent: Mutex<Vec<TransactionRequest>>,
    /// Block numbers whose fetch fails with a transport error
    unavailable: Mutex<Vec<u64>>,
    fetches: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let chain = Self::new();
        {
            let mut map = chain.blocks.lock().unwrap();
            for block in blocks {
                map.insert(block.number, block);
            }
        }
        chain
    }

    pub fn mark_unavailable(&self, number: u64) {
        self.unavailable.lock().unwrap().push(number);
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn head(&self) -> u64 {
        self.blocks
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl BlockSource for MockChain {
    async fn block_number(&self) -> RpcResult<u64> {
        Ok(self.head())
    }

    async fn get_block_by_number(&self, number: u64) -> RpcResult<Block> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.lock().unwrap().contains(&number) {
            return Err(RpcError::MaxRetriesExceeded {
                operation: format!("eth_getBlockByNumber({})", number),
            });
        }
        self.blocks
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or(RpcError::BlockNotFound { number })
    }
}

#[async_trait]
impl TransactionSender for MockChain {
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> RpcResult<TransactionReceipt> {
        let mut blocks = self.blocks.lock().unwrap();
        let number = blocks.keys().next_back().map(|n| n + 1).unwrap_or(1);
        let hash = TxHash::from(U256::from(number).to_be_bytes::<32>());

        blocks.insert(
            number,
            Block {
                number,
                timestamp: FIXTURE_TIMESTAMP + number,
                transactions: vec![ChainTransaction {
                    hash,
                    from: request.from.unwrap_or_else(fixture_sender),
                    to: Some(request.to),
                    value: request.value.unwrap_or_default(),
                    input: request.data.clone().unwrap_or_default(),
                }],
            },
        );
        self.sent.lock().unwrap().push(request);

        Ok(TransactionReceipt {
            transaction_hash: hash,
        })
    }
}
