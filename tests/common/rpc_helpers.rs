//! Chain RPC Test Utilities
//!
//! Configuration and mock JSON-RPC endpoint helpers for tests that exercise
//! `EthRpcClient` against a local `mockito` server instead of a live node.

use ghosttag::config::ChainRpcConfig;
use mockito::{Matcher, Mock, Request, ServerGuard};
use serde_json::{json, Value};

/// Create chain RPC configuration pointing at `url`
///
/// Short timeouts and backoff keep retry tests fast.
pub fn create_test_rpc_config(url: &str) -> ChainRpcConfig {
    ChainRpcConfig {
        url: url.to_string(),
        timeout_seconds: 5,
        max_retries: 2,
        initial_backoff_ms: 10,
        backoff_multiplier: 1.5,
        max_backoff_seconds: 1,
        concurrent_requests: 4,
    }
}

/// JSON-RPC success envelope
pub fn rpc_result(result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": 0, "result": result })
}

/// JSON-RPC error envelope
pub fn rpc_error(code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 0,
        "error": { "code": code, "message": message }
    })
}

/// Answer with `envelope`, echoing the request's `id`
pub fn reply_with(envelope: Value) -> impl Fn(&Request) -> Vec<u8> + Send + Sync + 'static {
    move |request| {
        let id = request
            .body()
            .ok()
            .and_then(|body| serde_json::from_slice::<Value>(body).ok())
            .and_then(|body| body.get("id").cloned())
            .unwrap_or(json!(0));
        let mut envelope = envelope.clone();
        envelope["id"] = id;
        envelope.to_string().into_bytes()
    }
}

/// Mock for `method` answering with `envelope`, not yet created
pub fn method_mock(server: &mut ServerGuard, method: &str, envelope: Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(reply_with(envelope))
}

/// Mock answering `method` with a success result
pub async fn mock_method(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
    method_mock(server, method, rpc_result(result))
        .create_async()
        .await
}

/// Mock answering `eth_chainId`, needed by every `EthRpcClient::new`
pub async fn mock_chain_id(server: &mut ServerGuard) -> Mock {
    mock_method(server, "eth_chainId", json!("0x1")).await
}

/// 32-byte hash whose last byte is `id`
pub fn hash_hex(id: u64) -> String {
    format!("0x{:064x}", id)
}

/// Full block JSON as a node would return it for `eth_getBlockByNumber(n, true)`
pub fn block_json(number: u64, transactions: Vec<Value>) -> Value {
    let zero_hash = hash_hex(0);
    json!({
        "hash": hash_hex(0xb000 + number),
        "parentHash": zero_hash,
        "sha3Uncles": zero_hash,
        "miner": "0x0000000000000000000000000000000000000000",
        "stateRoot": zero_hash,
        "transactionsRoot": zero_hash,
        "receiptsRoot": zero_hash,
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "difficulty": "0x0",
        "number": format!("0x{:x}", number),
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x5208",
        "timestamp": "0x65920080",
        "extraData": "0x",
        "mixHash": zero_hash,
        "nonce": "0x0000000000000000",
        "baseFeePerGas": "0x7",
        "size": "0x220",
        "uncles": [],
        "transactions": transactions,
    })
}

/// Signed legacy transaction carrying a 1 ether value and `input`
pub fn transaction_json(block_number: u64, id: u64, input: &str) -> Value {
    json!({
        "type": "0x0",
        "hash": hash_hex(id),
        "nonce": format!("0x{:x}", id),
        "blockHash": hash_hex(0xb000 + block_number),
        "blockNumber": format!("0x{:x}", block_number),
        "transactionIndex": "0x0",
        "from": "0x1111111111111111111111111111111111111111",
        "to": "0x2222222222222222222222222222222222222222",
        "value": "0xde0b6b3a7640000",
        "gasPrice": "0x3b9aca00",
        "gas": "0x5208",
        "input": input,
        "chainId": "0x1",
        "v": "0x25",
        "r": "0x1b5e176d927f8e9ab405058b2d2457392da3e20f328b16ddabcebc33eaac5fea",
        "s": "0x4ba69724e8f69de52f0125ad8b3c5c2cef33019bac3249e2c0a2192766d1721c",
    })
}
