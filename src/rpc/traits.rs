//! Seams between the core and the chain client
//!
//! The detector only needs block retrieval and the proxy only needs call
//! encoding plus dispatch. [`crate::rpc::EthRpcClient`] implements the first
//! two over an alloy HTTP provider; ABI encoding is always supplied by the caller.

use crate::errors::RpcResult;
use crate::types::{Block, TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use alloy::primitives::Bytes;
use serde_json::Value;

/// Read access to blocks
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Current head block number
    async fn block_number(&self) -> RpcResult<u64>;

    /// Full block including transaction bodies
    async fn get_block_by_number(&self, number: u64) -> RpcResult<Block>;
}

/// Transaction dispatch
#[async_trait]
pub trait TransactionSender: Send + Sync {
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> RpcResult<TransactionReceipt>;
}

/// Contract call encoding (method name + arguments → call data)
pub trait CallEncoder: Send + Sync {
    fn encode_call(&self, method: &str, args: &[Value]) -> Result<Bytes, String>;
}
