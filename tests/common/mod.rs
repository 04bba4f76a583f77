//! Common Test Utilities
//!
//! Shared chain fixtures and an in-memory chain used across the unit and
//! integration suites.

#![allow(dead_code)]

pub mod mock_chain;
pub mod rpc_helpers;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use ghosttag::codec::{encode_marker_and_tag, encode_payload};
use ghosttag::types::{Block, ChainTransaction};

/// Default timestamp for fixture blocks (2024-01-01T00:00:00Z)
pub const FIXTURE_TIMESTAMP: u64 = 1_704_067_200;

/// `0xdeadbeef` call data followed by `marker ‖ tag ‖ payload`
pub fn tagged_input(tag: &str, payload: &str) -> String {
    format!(
        "0xdeadbeef{}{}",
        encode_marker_and_tag(tag),
        encode_payload(payload)
    )
}

/// Default sender of fixture and mock-chain transactions
pub fn fixture_sender() -> Address {
    Address::repeat_byte(0x11)
}

/// Transaction with a 1 ether value and the given hex input
pub fn fixture_transaction(id: u8, input: &str) -> ChainTransaction {
    ChainTransaction {
        hash: TxHash::with_last_byte(id),
        from: fixture_sender(),
        to: Some(Address::repeat_byte(0x22)),
        value: U256::from(1_000_000_000_000_000_000u64),
        input: input.parse::<Bytes>().expect("fixture input is hex"),
    }
}

pub fn fixture_block(number: u64, transactions: Vec<ChainTransaction>) -> Block {
    Block {
        number,
        timestamp: FIXTURE_TIMESTAMP,
        transactions,
    }
}
