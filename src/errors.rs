use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Chain JSON-RPC operations
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Tag encoding/decoding
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Tagged transaction construction or dispatch
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// File I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// RPC error types
#[derive(Error, Debug)]
pub enum RpcError {
    /// Failed to reach the JSON-RPC endpoint
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The node answered with a JSON-RPC error object
    #[error("RPC call failed: {method} - {message}")]
    CallFailed { method: String, message: String },

    /// Failed to deserialise RPC response data
    #[error("Deserialisation failed: {0}")]
    DeserialisationFailed(String),

    /// Retry limit exceeded for RPC operation
    #[error("Max retries exceeded: {operation}")]
    MaxRetriesExceeded { operation: String },

    /// RPC request timed out
    #[error("Request timeout: {timeout_seconds}s for {operation}")]
    Timeout {
        timeout_seconds: u64,
        operation: String,
    },

    /// RPC returned unexpected or malformed response data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Block number is valid but the node does not have it (yet)
    #[error("Block not found: {number}")]
    BlockNotFound { number: u64 },
}

impl RpcError {
    /// Whether the failure is worth another attempt.
    ///
    /// Node-side rejections (`CallFailed`) are deterministic and never retried.
    /// A missing block is retried since load-balanced endpoints can lag the head.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RpcError::ConnectionFailed(_)
                | RpcError::Timeout { .. }
                | RpcError::InvalidResponse(_)
                | RpcError::BlockNotFound { .. }
        )
    }
}

/// Errors raised while encoding or decoding tag bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input is not an even-length run of hex digits
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded bytes are not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// A payload looked like JSON but did not parse
#[derive(Error, Debug)]
#[error("Payload JSON parse failed: {0}")]
pub struct PayloadParseError(#[from] pub serde_json::Error);

/// Errors raised by the tagging proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The call encoder rejected the method or its arguments
    #[error("Call encoding failed for {method}: {message}")]
    CallEncoding { method: String, message: String },

    /// The native-currency amount in the options object is unusable
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The underlying sender failed
    #[error("Send failed: {0}")]
    Send(#[from] RpcError),
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
