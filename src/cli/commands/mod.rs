pub mod decode;
pub mod encode;
pub mod send;
pub mod test_rpc;
pub mod watch;

use crate::codec::{encode_payload, normalise_hex, tag_to_hex};
use crate::config::ChainRpcConfig;
use crate::errors::{AppError, AppResult, RpcError, RpcResult};
use crate::rpc::TransactionSender;
use crate::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use clap::{ArgGroup, Args};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// At most one source for the tag bytes
///
/// Commands that always need a tag add [`required_tag_group`] on top.
#[derive(Args, Debug, Clone, Default)]
#[group(id = "tag_source", multiple = false)]
pub struct TagArgs {
    /// Text tag (UTF-8)
    #[arg(long)]
    pub tag: Option<String>,

    /// Tag given as hex bytes, with or without 0x
    #[arg(long)]
    pub hex_tag: Option<String>,

    /// Use the SHA-256 digest of this file as the tag
    #[arg(long, value_name = "FILE")]
    pub digest_of: Option<PathBuf>,
}

/// Arg ids of [`TagArgs`], for commands that must be given one of them
pub const TAG_SOURCE_ARGS: [&str; 3] = ["tag", "hex_tag", "digest_of"];

/// Group that makes one of [`TAG_SOURCE_ARGS`] mandatory
pub fn required_tag_group() -> ArgGroup {
    ArgGroup::new("required_tag")
        .args(TAG_SOURCE_ARGS)
        .required(true)
}

impl TagArgs {
    /// No tag source was given
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.hex_tag.is_none() && self.digest_of.is_none()
    }

    /// Tag bytes as lowercase hex (marker not included)
    pub fn tag_hex(&self) -> AppResult<String> {
        if let Some(tag) = &self.tag {
            return Ok(tag_to_hex(tag));
        }
        if let Some(hex_tag) = &self.hex_tag {
            return Ok(normalise_hex(hex_tag)?);
        }
        if let Some(path) = &self.digest_of {
            return sha256_file_hex(path);
        }
        Err(AppError::InvalidData(
            "one of --tag, --hex-tag or --digest-of is required".to_string(),
        ))
    }

    /// Tag hex followed by the hex of an optional payload
    pub fn tag_and_payload_hex(&self, payload: Option<&str>) -> AppResult<String> {
        let mut hex = self.tag_hex()?;
        if let Some(payload) = payload {
            hex.push_str(&encode_payload(payload));
        }
        Ok(hex)
    }
}

/// SHA-256 of a file's contents as lowercase hex
pub fn sha256_file_hex(path: &Path) -> AppResult<String> {
    let contents = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&contents)))
}

/// Sender for offline commands; `prepare`/`prepare_hex` never dispatch
pub(crate) struct OfflineSender;

#[async_trait]
impl TransactionSender for OfflineSender {
    async fn send_transaction(
        &self,
        _request: TransactionRequest,
    ) -> RpcResult<TransactionReceipt> {
        Err(RpcError::CallFailed {
            method: "eth_sendTransaction".to_string(),
            message: "offline command cannot send".to_string(),
        })
    }
}

/// Configured chain RPC settings with an optional URL override from the CLI
pub fn rpc_config_with_override(rpc_url: Option<&str>) -> ChainRpcConfig {
    let mut rpc_config = crate::config::AppConfig::get_defaults().chain_rpc;
    if let Some(url) = rpc_url {
        rpc_config.url = url.to_string();
    }
    rpc_config
}
