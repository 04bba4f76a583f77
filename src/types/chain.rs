//! Chain types consumed by the detector and built by the proxy
//!
//! These are narrow views over alloy's RPC types holding only the fields the
//! detector reads or the proxy writes. Amounts stay in wei as [`U256`]; see
//! [`crate::utils::currency`] for display conversions.

use alloy::consensus::Transaction as ConsensusTransaction;
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::rpc::types::{
    Block as RpcBlock, Transaction as RpcTransaction, TransactionInput,
    TransactionRequest as RpcTransactionRequest,
};
use serde::{Deserialize, Serialize};

/// A block with its full transaction bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub timestamp: u64,
    pub transactions: Vec<ChainTransaction>,
}

/// A transaction body inside a full block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    /// Wei
    pub value: U256,
    pub input: Bytes,
}

/// Parameters for `eth_sendTransaction`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

/// Result of dispatching a transaction
///
/// `eth_sendTransaction` answers with the transaction hash only; confirmation
/// tracking is left to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
}

impl From<&RpcTransaction> for ChainTransaction {
    fn from(tx: &RpcTransaction) -> Self {
        Self {
            hash: TransactionResponse::tx_hash(tx),
            from: TransactionResponse::from(tx),
            to: ConsensusTransaction::to(tx),
            value: ConsensusTransaction::value(tx),
            input: ConsensusTransaction::input(tx).clone(),
        }
    }
}

impl From<RpcBlock> for Block {
    fn from(block: RpcBlock) -> Self {
        let transactions = block
            .transactions
            .as_transactions()
            .unwrap_or_default()
            .iter()
            .map(ChainTransaction::from)
            .collect();

        Self {
            number: block.header.number,
            timestamp: block.header.timestamp,
            transactions,
        }
    }
}

impl From<TransactionRequest> for RpcTransactionRequest {
    fn from(request: TransactionRequest) -> Self {
        RpcTransactionRequest {
            from: request.from,
            to: Some(TxKind::Call(request.to)),
            value: request.value,
            input: request.data.map(TransactionInput::new).unwrap_or_default(),
            ..Default::default()
        }
    }
}
