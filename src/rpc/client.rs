use crate::config::ChainRpcConfig;
use crate::errors::{RpcError, RpcResult};
use crate::rpc::{
    execute_with_timeout, retry_with_backoff, BlockSource, RetryPolicy, TransactionSender,
};
use crate::types::{Block, TransactionReceipt, TransactionRequest};
use alloy::eips::BlockNumberOrTag;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use alloy::transports::{RpcError as TransportRpcError, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, info};

/// RPC request types for the async worker pattern
#[derive(Debug)]
pub enum RpcRequest {
    BlockNumber {
        tx: oneshot::Sender<RpcResult<u64>>,
    },
    GetBlockByNumber {
        number: u64,
        tx: oneshot::Sender<RpcResult<Block>>,
    },
    SendTransaction {
        request: TransactionRequest,
        tx: oneshot::Sender<RpcResult<TransactionReceipt>>,
    },
    TestConnection {
        tx: oneshot::Sender<RpcResult<u64>>,
    },
}

/// Ethereum JSON-RPC client with retry logic and an async worker
pub struct EthRpcClient {
    request_tx: mpsc::Sender<RpcRequest>,
    error_count: Arc<AtomicU64>,
    concurrent_requests: usize,
}

impl EthRpcClient {
    /// Create a new RPC client, verify the endpoint answers, and spawn the worker task
    pub async fn new(config: ChainRpcConfig) -> RpcResult<Self> {
        let provider = connect(&config)?;

        // Test connection before starting worker
        let chain_id = execute_with_timeout(config.timeout_seconds, provider.get_chain_id())
            .await
            .map_err(|_| RpcError::Timeout {
                timeout_seconds: config.timeout_seconds,
                operation: "eth_chainId".to_string(),
            })?
            .map_err(|e| {
                RpcError::ConnectionFailed(format!(
                    "Failed to connect to chain RPC at {} (is the node running?): {}",
                    config.url, e
                ))
            })?;
        info!(
            "Chain RPC connection established successfully (chain id {})",
            chain_id
        );

        Ok(Self::spawn(config, provider))
    }

    fn spawn(config: ChainRpcConfig, provider: DynProvider) -> Self {
        let (request_tx, request_rx) = mpsc::channel(100);
        let error_count = Arc::new(AtomicU64::new(0));
        let concurrent_requests = config.concurrent_requests;

        let worker = RpcWorker::new(config, provider, Arc::clone(&error_count));
        tokio::spawn(worker.run(request_rx));

        Self {
            request_tx,
            error_count,
            concurrent_requests,
        }
    }

    /// Test RPC connection, returning the chain id
    pub async fn test_connection(&self) -> RpcResult<u64> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(RpcRequest::TestConnection { tx }).await?;
        Self::await_reply(rx).await
    }

    /// Get the current error count from RPC operations
    pub fn get_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Get the configured concurrent request limit
    pub fn get_concurrent_limit(&self) -> usize {
        self.concurrent_requests
    }

    async fn dispatch(&self, request: RpcRequest) -> RpcResult<()> {
        self.request_tx
            .send(request)
            .await
            .map_err(|_| RpcError::ConnectionFailed("Failed to send RPC request".to_string()))
    }

    async fn await_reply<T>(rx: oneshot::Receiver<RpcResult<T>>) -> RpcResult<T> {
        rx.await
            .map_err(|_| RpcError::ConnectionFailed("RPC worker channel closed".to_string()))?
    }
}

#[async_trait]
impl BlockSource for EthRpcClient {
    async fn block_number(&self) -> RpcResult<u64> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(RpcRequest::BlockNumber { tx }).await?;
        Self::await_reply(rx).await
    }

    async fn get_block_by_number(&self, number: u64) -> RpcResult<Block> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(RpcRequest::GetBlockByNumber { number, tx })
            .await?;
        Self::await_reply(rx).await
    }
}

#[async_trait]
impl TransactionSender for EthRpcClient {
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> RpcResult<TransactionReceipt> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(RpcRequest::SendTransaction { request, tx })
            .await?;
        Self::await_reply(rx).await
    }
}

/// Build an HTTP provider for `config.url`
///
/// Recommended fillers are disabled: requests go to the node exactly as the
/// proxy built them and the node's own account signs `eth_sendTransaction`.
fn connect(config: &ChainRpcConfig) -> RpcResult<DynProvider> {
    let url: Url = config.url.parse().map_err(|e| {
        RpcError::ConnectionFailed(format!("Invalid RPC URL '{}': {}", config.url, e))
    })?;

    Ok(ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(url)
        .erased())
}

/// Classify a provider failure for the retry loop
fn classify_transport_error(method: &str, error: TransportError) -> RpcError {
    match error {
        TransportRpcError::ErrorResp(payload) => RpcError::CallFailed {
            method: method.to_string(),
            message: format!("{} (code {})", payload.message, payload.code),
        },
        TransportRpcError::DeserError { err, .. } => {
            RpcError::DeserialisationFailed(format!("{} result: {}", method, err))
        }
        // HTTP 5xx/429 and refused connections all surface as transport errors
        TransportRpcError::Transport(kind) => {
            RpcError::ConnectionFailed(format!("{}: {}", method, kind))
        }
        other => RpcError::InvalidResponse(format!("{}: {}", method, other)),
    }
}

/// RPC worker that handles all node communication in a dedicated task
struct RpcWorker {
    provider: DynProvider,
    config: ChainRpcConfig,
    semaphore: Arc<Semaphore>,
    error_count: Arc<AtomicU64>,
}

impl RpcWorker {
    fn new(config: ChainRpcConfig, provider: DynProvider, error_count: Arc<AtomicU64>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrent_requests.max(1)));
        Self {
            provider,
            config,
            semaphore,
            error_count,
        }
    }

    async fn run(self, mut request_rx: mpsc::Receiver<RpcRequest>) {
        info!(
            "RPC worker started with {} concurrent request limit",
            self.config.concurrent_requests
        );

        while let Some(request) = request_rx.recv().await {
            let worker = self.clone();

            // Spawn each request in its own task for parallel processing
            tokio::spawn(async move {
                worker.handle_request(request).await;
            });
        }

        info!("RPC worker shutting down");
    }

    async fn handle_request(&self, request: RpcRequest) {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                debug!("Semaphore closed, dropping request: {}", e);
                return;
            }
        };

        match request {
            RpcRequest::BlockNumber { tx } => {
                let result = self.block_number_with_retry().await;
                let _ = tx.send(result);
            }
            RpcRequest::GetBlockByNumber { number, tx } => {
                let result = self.get_block_with_retry(number).await;
                let _ = tx.send(result);
            }
            RpcRequest::SendTransaction { request, tx } => {
                let result = self.send_transaction_once(request).await;
                let _ = tx.send(result);
            }
            RpcRequest::TestConnection { tx } => {
                let result = self.chain_id().await;
                let _ = tx.send(result);
            }
        }
    }

    fn policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config)
    }

    fn record_failure(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    async fn block_number_with_retry(&self) -> RpcResult<u64> {
        retry_with_backoff(
            &self.policy(),
            "eth_blockNumber",
            || self.record_failure(),
            move || async move {
                self.provider
                    .get_block_number()
                    .await
                    .map_err(|e| classify_transport_error("eth_blockNumber", e))
            },
        )
        .await
    }

    async fn get_block_with_retry(&self, number: u64) -> RpcResult<Block> {
        let operation = format!("eth_getBlockByNumber({})", number);
        retry_with_backoff(
            &self.policy(),
            &operation,
            || self.record_failure(),
            move || async move {
                let block = self
                    .provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .full()
                    .await
                    .map_err(|e| classify_transport_error("eth_getBlockByNumber", e))?;
                block
                    .map(Block::from)
                    .ok_or(RpcError::BlockNotFound { number })
            },
        )
        .await
    }

    /// Sends are never retried: a timed-out send may still have been accepted
    async fn send_transaction_once(
        &self,
        request: TransactionRequest,
    ) -> RpcResult<TransactionReceipt> {
        let transaction_hash = retry_with_backoff(
            &RetryPolicy::once(self.config.timeout_seconds),
            "eth_sendTransaction",
            || self.record_failure(),
            move || {
                let request = request.clone();
                async move {
                    let pending = self
                        .provider
                        .send_transaction(request.into())
                        .await
                        .map_err(|e| classify_transport_error("eth_sendTransaction", e))?;
                    Ok(*pending.tx_hash())
                }
            },
        )
        .await?;

        debug!("Transaction dispatched: {}", transaction_hash);
        Ok(TransactionReceipt { transaction_hash })
    }

    async fn chain_id(&self) -> RpcResult<u64> {
        retry_with_backoff(
            &self.policy(),
            "eth_chainId",
            || self.record_failure(),
            move || async move {
                self.provider
                    .get_chain_id()
                    .await
                    .map_err(|e| classify_transport_error("eth_chainId", e))
            },
        )
        .await
    }
}

impl Clone for RpcWorker {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            config: self.config.clone(),
            semaphore: Arc::clone(&self.semaphore),
            error_count: Arc::clone(&self.error_count),
        }
    }
}
