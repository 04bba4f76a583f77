use crate::cli::commands::{required_tag_group, OfflineSender, TagArgs};
use crate::errors::{AppError, AppResult};
use crate::proxy::TaggedWallet;
use crate::types::TransactionRequest;
use alloy::primitives::Bytes;
use clap::Args;
use std::sync::Arc;

/// Print tagged call data without sending anything
#[derive(Args)]
#[command(group(required_tag_group()))]
pub struct EncodeCommand {
    #[command(flatten)]
    pub tag: TagArgs,

    /// Payload appended after the tag (JSON object or key:value text)
    #[arg(long)]
    pub payload: Option<String>,

    /// Existing call data to append the tag to
    #[arg(long, default_value = "0x")]
    pub data: String,
}

impl EncodeCommand {
    pub fn run(&self) -> AppResult<()> {
        println!("{}", self.encode()?);
        Ok(())
    }

    /// Existing data + marker + tag + payload, as the wallet proxy would send it
    pub fn encode(&self) -> AppResult<String> {
        let data: Bytes = self
            .data
            .parse()
            .map_err(|e| AppError::InvalidData(format!("--data '{}': {}", self.data, e)))?;
        let suffix = self.tag.tag_and_payload_hex(self.payload.as_deref())?;

        let prepared = TaggedWallet::new(Arc::new(OfflineSender))
            .send_transaction(TransactionRequest {
                data: Some(data),
                ..Default::default()
            })
            .prepare_hex(&suffix)?;

        Ok(prepared.data.unwrap_or_default().to_string())
    }
}
