//! Tagging proxy
//!
//! Wraps a contract or a raw-send wallet so that every forwarded call returns a
//! [`PendingTaggedTransaction`] instead of dispatching. Nothing is sent until
//! [`PendingTaggedTransaction::tag`] or [`PendingTaggedTransaction::hex_tag`]
//! supplies the tag; call data is encoded at that point and the tag suffix is
//! appended before the single dispatch.
//!
//! - `TaggedContract` - ABI-encodes `method(args)` through a [`CallEncoder`]
//! - `TaggedWallet` - appends the tag to the raw `data` of a send

use crate::codec::{encode_hex_tag, encode_marker_and_tag};
use crate::errors::{CodecError, ProxyError, ProxyResult};
use crate::rpc::{CallEncoder, TransactionSender};
use crate::types::{TransactionReceipt, TransactionRequest};
use crate::utils::currency::parse_wei;
use alloy::primitives::{Address, Bytes, U256};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Contract whose calls are deferred until tagged
#[derive(Clone)]
pub struct TaggedContract {
    address: Address,
    from: Option<Address>,
    encoder: Arc<dyn CallEncoder>,
    sender: Arc<dyn TransactionSender>,
}

impl TaggedContract {
    pub fn new(
        address: Address,
        encoder: Arc<dyn CallEncoder>,
        sender: Arc<dyn TransactionSender>,
    ) -> Self {
        Self {
            address,
            from: None,
            encoder,
            sender,
        }
    }

    /// Set the `from` field on every dispatched transaction
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Capture `method(args)` for later tagging
    ///
    /// A trailing JSON object with a `value` field is treated as call options:
    /// it is left out of the encoded arguments and its value is sent as the
    /// native amount.
    pub fn call(&self, method: impl Into<String>, args: Vec<Value>) -> PendingTaggedTransaction {
        PendingTaggedTransaction {
            call: PendingCall::Contract {
                address: self.address,
                from: self.from,
                encoder: Arc::clone(&self.encoder),
                method: method.into(),
                args,
            },
            sender: Arc::clone(&self.sender),
        }
    }
}

/// Wallet whose raw sends are deferred until tagged
#[derive(Clone)]
pub struct TaggedWallet {
    sender: Arc<dyn TransactionSender>,
}

impl TaggedWallet {
    pub fn new(sender: Arc<dyn TransactionSender>) -> Self {
        Self { sender }
    }

    pub fn send_transaction(&self, request: TransactionRequest) -> PendingTaggedTransaction {
        PendingTaggedTransaction {
            call: PendingCall::Raw { request },
            sender: Arc::clone(&self.sender),
        }
    }
}

enum PendingCall {
    Contract {
        address: Address,
        from: Option<Address>,
        encoder: Arc<dyn CallEncoder>,
        method: String,
        args: Vec<Value>,
    },
    Raw {
        request: TransactionRequest,
    },
}

/// A captured call waiting for its tag
///
/// Tagging consumes the value, so a pending call is dispatched at most once.
pub struct PendingTaggedTransaction {
    call: PendingCall,
    sender: Arc<dyn TransactionSender>,
}

impl PendingTaggedTransaction {
    /// Name of the forwarded operation
    pub fn method(&self) -> &str {
        match &self.call {
            PendingCall::Contract { method, .. } => method,
            PendingCall::Raw { .. } => "sendTransaction",
        }
    }

    /// Build the tagged request without sending it
    pub fn prepare(&self, tag: &str) -> ProxyResult<TransactionRequest> {
        self.build(&encode_marker_and_tag(tag))
    }

    /// Build the request for a caller-supplied hex tag without sending it
    pub fn prepare_hex(&self, tag_hex: &str) -> ProxyResult<TransactionRequest> {
        self.build(&encode_hex_tag(tag_hex)?)
    }

    /// Append `tag` and dispatch
    pub async fn tag(self, tag: &str) -> ProxyResult<TransactionReceipt> {
        let request = self.prepare(tag)?;
        self.dispatch(request).await
    }

    /// Append a hex tag (e.g. a content digest) and dispatch
    pub async fn hex_tag(self, tag_hex: &str) -> ProxyResult<TransactionReceipt> {
        let request = self.prepare_hex(tag_hex)?;
        self.dispatch(request).await
    }

    async fn dispatch(self, request: TransactionRequest) -> ProxyResult<TransactionReceipt> {
        debug!(
            "Dispatching tagged {} to {} ({} bytes of call data)",
            self.method(),
            request.to,
            request.data.as_ref().map(|d| d.len()).unwrap_or(0)
        );
        let receipt = self.sender.send_transaction(request).await?;
        info!("Tagged transaction sent: {}", receipt.transaction_hash);
        Ok(receipt)
    }

    fn build(&self, tag_suffix: &str) -> ProxyResult<TransactionRequest> {
        match &self.call {
            PendingCall::Contract {
                address,
                from,
                encoder,
                method,
                args,
            } => {
                let (abi_args, value) = split_call_options(args);
                let value = value.map(value_to_wei).transpose()?;
                let encoded = encoder
                    .encode_call(method, &abi_args)
                    .map_err(|message| ProxyError::CallEncoding {
                        method: method.clone(),
                        message,
                    })?;

                Ok(TransactionRequest {
                    from: *from,
                    to: *address,
                    data: Some(append_suffix(Some(&encoded), tag_suffix)?),
                    value,
                })
            }
            PendingCall::Raw { request } => Ok(TransactionRequest {
                data: Some(append_suffix(request.data.as_ref(), tag_suffix)?),
                ..request.clone()
            }),
        }
    }
}

/// Separate a trailing options object (`{"value": ...}`) from ABI arguments
pub fn split_call_options(args: &[Value]) -> (Vec<Value>, Option<&Value>) {
    match args.split_last() {
        Some((Value::Object(options), rest)) if options.contains_key("value") => {
            (rest.to_vec(), options.get("value"))
        }
        _ => (args.to_vec(), None),
    }
}

/// Native amount from an options object: integer wei, or decimal / `0x` hex string
fn value_to_wei(value: &Value) -> ProxyResult<U256> {
    let wei = match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => parse_wei(s),
        _ => None,
    };
    wei.ok_or_else(|| ProxyError::InvalidValue(value.to_string()))
}

/// Existing data (if any) followed by the hex tag suffix
fn append_suffix(data: Option<&Bytes>, tag_suffix: &str) -> ProxyResult<Bytes> {
    let suffix = hex::decode(tag_suffix).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
    let mut tagged = data.map(|d| d.to_vec()).unwrap_or_default();
    tagged.extend_from_slice(&suffix);
    Ok(Bytes::from(tagged))
}
