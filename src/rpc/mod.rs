//! Chain JSON-RPC integration module
//!
//! This module provides everything the core consumes from the chain client:
//! - **Traits** - `BlockSource`, `TransactionSender`, `CallEncoder`: the narrow seams
//!   the detector and proxy depend on
//! - **Client** - Async Ethereum JSON-RPC client with retry logic
//! - **Notifier** - Head polling that turns the chain into a stream of block numbers
//! - **Retry** - Exponential backoff retry utilities and timeout wrappers
//!
//! The client drives an alloy HTTP provider behind an async worker with
//! channel-based request/response handling.

pub mod client;
pub mod notifier;
pub mod retry;
pub mod traits;

// Re-export main types
pub use client::{EthRpcClient, RpcRequest};
pub use notifier::BlockNotifier;
pub use retry::{calculate_next_backoff, execute_with_timeout, retry_with_backoff, RetryPolicy};
pub use traits::{BlockSource, CallEncoder, TransactionSender};
