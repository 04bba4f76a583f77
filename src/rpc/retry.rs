//! Retry logic utilities for RPC operations
//!
//! This module provides helper functions for implementing exponential backoff
//! retry logic and timeout wrappers for RPC client operations.

use crate::config::ChainRpcConfig;
use crate::errors::{RpcError, RpcResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};

/// Calculate next backoff duration using exponential backoff with a maximum cap
///
/// This is a pure helper function that implements the exponential backoff formula:
/// `new_backoff = min(current_backoff * multiplier, max_backoff)`
///
/// # Arguments
/// * `current_backoff` - Current backoff duration
/// * `multiplier` - Multiplier for exponential increase (typically 1.5-2.0)
/// * `max_backoff_seconds` - Maximum backoff duration in seconds
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ghosttag::rpc::calculate_next_backoff;
///
/// let backoff = Duration::from_millis(100);
/// let next = calculate_next_backoff(backoff, 2.0, 30);
/// assert_eq!(next, Duration::from_millis(200));
/// ```
pub fn calculate_next_backoff(
    current_backoff: Duration,
    multiplier: f64,
    max_backoff_seconds: u64,
) -> Duration {
    Duration::from_millis((current_backoff.as_millis() as f64 * multiplier) as u64)
        .min(Duration::from_secs(max_backoff_seconds))
}

/// Run an RPC future under a timeout
///
/// # Returns
/// - `Err(Elapsed)` when the timeout fires
/// - `Ok(result)` with the future's own output otherwise
pub async fn execute_with_timeout<T, F>(timeout_seconds: u64, operation: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    timeout(Duration::from_secs(timeout_seconds), operation).await
}

/// Retry/timeout settings extracted from [`ChainRpcConfig`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
}

impl RetryPolicy {
    /// Single attempt, no backoff. Used for non-idempotent calls.
    pub fn once(timeout_seconds: u64) -> Self {
        Self {
            timeout_seconds,
            max_retries: 1,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_seconds: 0,
        }
    }
}

impl From<&ChainRpcConfig> for RetryPolicy {
    fn from(config: &ChainRpcConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries.max(1),
            initial_backoff_ms: config.initial_backoff_ms,
            backoff_multiplier: config.backoff_multiplier,
            max_backoff_seconds: config.max_backoff_seconds,
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up
///
/// Every failed attempt (including timeouts) invokes `on_failure`, which the
/// client uses to maintain its error counter.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut on_failure: impl FnMut(),
    mut operation: F,
) -> RpcResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RpcResult<T>>,
{
    let mut attempts = 0;
    let mut backoff = Duration::from_millis(policy.initial_backoff_ms);

    loop {
        attempts += 1;
        let failure = match execute_with_timeout(policy.timeout_seconds, operation()).await {
            Ok(Ok(value)) => {
                if attempts > 1 {
                    debug!("{} succeeded after {} attempts", operation_name, attempts);
                }
                return Ok(value);
            }
            Ok(Err(e)) => e,
            Err(_) => RpcError::Timeout {
                timeout_seconds: policy.timeout_seconds,
                operation: operation_name.to_string(),
            },
        };
        on_failure();

        if !failure.is_retryable() {
            debug!("{} failed (non-retryable): {}", operation_name, failure);
            return Err(failure);
        }

        if attempts >= policy.max_retries {
            if policy.max_retries == 1 {
                return Err(failure);
            }
            error!(
                "{} failed after {} attempts: {}",
                operation_name, attempts, failure
            );
            return Err(match failure {
                timeout @ RpcError::Timeout { .. } => timeout,
                _ => RpcError::MaxRetriesExceeded {
                    operation: operation_name.to_string(),
                },
            });
        }

        warn!(
            "{} attempt {} failed, retrying in {:?}: {}",
            operation_name, attempts, backoff, failure
        );
        sleep(backoff).await;

        backoff = calculate_next_backoff(
            backoff,
            policy.backoff_multiplier,
            policy.max_backoff_seconds,
        );
    }
}
