use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use ghosttag::config::ChainRpcConfig;
use ghosttag::errors::RpcError;
use ghosttag::rpc::{calculate_next_backoff, retry_with_backoff, RetryPolicy, RpcRequest};
use ghosttag::types::{Block, TransactionReceipt, TransactionRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};

/// Tests for the chain RPC client component
///
/// These tests verify request plumbing and retry behaviour without a live node.

#[test]
fn test_rpc_config_creation() {
    let config = ChainRpcConfig::default();

    assert_eq!(config.url, "http://localhost:8545");
    assert_eq!(config.timeout_seconds, 30);
    assert!(config.max_retries > 0);
    assert!(config.concurrent_requests > 0);
    assert!(config.initial_backoff_ms > 0);
    assert!(config.backoff_multiplier > 1.0);
    assert!(config.max_backoff_seconds > 0);
}

#[test]
fn test_backoff_sequence_is_capped() {
    let mut backoff = Duration::from_millis(400);
    let mut sequence = Vec::new();
    for _ in 0..5 {
        backoff = calculate_next_backoff(backoff, 2.0, 3);
        sequence.push(backoff.as_millis());
    }
    assert_eq!(sequence, vec![800, 1600, 3000, 3000, 3000]);
}

#[tokio::test]
async fn test_rpc_request_enum_creation() -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<RpcRequest>(10);

    let (response_tx, _response_rx) = oneshot::channel();
    tx.send(RpcRequest::GetBlockByNumber {
        number: 42,
        tx: response_tx,
    })
    .await?;

    match rx.recv().await {
        Some(RpcRequest::GetBlockByNumber { number, .. }) => assert_eq!(number, 42),
        _ => panic!("Wrong request type"),
    }

    let (response_tx, _response_rx) = oneshot::channel();
    tx.send(RpcRequest::TestConnection { tx: response_tx }).await?;
    assert!(matches!(
        rx.recv().await,
        Some(RpcRequest::TestConnection { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_rpc_channel_communication() -> Result<()> {
    let (request_tx, mut request_rx) = mpsc::channel::<RpcRequest>(10);

    // Minimal handler standing in for the worker
    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            match request {
                RpcRequest::BlockNumber { tx } => {
                    let _ = tx.send(Ok(100));
                }
                RpcRequest::GetBlockByNumber { number, tx } => {
                    let _ = tx.send(Ok(Block {
                        number,
                        timestamp: 0,
                        transactions: vec![],
                    }));
                }
                RpcRequest::SendTransaction { request, tx } => {
                    let _ = tx.send(Ok(TransactionReceipt {
                        transaction_hash: TxHash::left_padding_from(request.to.as_slice()),
                    }));
                }
                RpcRequest::TestConnection { tx } => {
                    let _ = tx.send(Ok(1));
                }
            }
        }
    });

    let (tx, rx) = oneshot::channel();
    request_tx.send(RpcRequest::BlockNumber { tx }).await?;
    assert_eq!(timeout(Duration::from_secs(1), rx).await???, 100);

    let (tx, rx) = oneshot::channel();
    request_tx
        .send(RpcRequest::GetBlockByNumber { number: 7, tx })
        .await?;
    assert_eq!(timeout(Duration::from_secs(1), rx).await???.number, 7);

    let (tx, rx) = oneshot::channel();
    request_tx
        .send(RpcRequest::SendTransaction {
            request: TransactionRequest {
                to: Address::repeat_byte(0xbe),
                ..Default::default()
            },
            tx,
        })
        .await?;
    assert_eq!(
        timeout(Duration::from_secs(1), rx).await???.transaction_hash,
        TxHash::left_padding_from(Address::repeat_byte(0xbe).as_slice())
    );

    Ok(())
}

#[tokio::test]
async fn test_retry_stops_on_non_retryable_error() {
    let attempts = AtomicUsize::new(0);
    let mut failures = 0;
    let policy = RetryPolicy {
        timeout_seconds: 1,
        max_retries: 5,
        initial_backoff_ms: 1,
        backoff_multiplier: 1.0,
        max_backoff_seconds: 1,
    };

    let result: Result<u64, RpcError> = retry_with_backoff(
        &policy,
        "eth_call",
        || failures += 1,
        || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(RpcError::CallFailed {
                method: "eth_call".to_string(),
                message: "execution reverted".to_string(),
            })
        },
    )
    .await;

    assert!(matches!(result, Err(RpcError::CallFailed { .. })));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let attempts = AtomicUsize::new(0);
    let policy = RetryPolicy {
        timeout_seconds: 1,
        max_retries: 3,
        initial_backoff_ms: 1,
        backoff_multiplier: 2.0,
        max_backoff_seconds: 1,
    };

    let result = retry_with_backoff(&policy, "eth_blockNumber", || {}, || async {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(RpcError::ConnectionFailed("reset".to_string()))
        } else {
            Ok(5u64)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 5);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_reports_timeout() {
    let policy = RetryPolicy::once(1);
    let result: Result<(), RpcError> =
        retry_with_backoff(&policy, "eth_sendTransaction", || {}, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

    assert!(matches!(
        result,
        Err(RpcError::Timeout {
            timeout_seconds: 1,
            ..
        })
    ));
}
