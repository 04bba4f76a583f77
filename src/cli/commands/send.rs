use crate::cli::commands::{required_tag_group, rpc_config_with_override, OfflineSender, TagArgs};
use crate::errors::{AppError, AppResult};
use crate::proxy::TaggedWallet;
use crate::rpc::EthRpcClient;
use crate::types::TransactionRequest;
use crate::utils::currency::parse_wei;
use alloy::primitives::{Address, Bytes};
use clap::Args;
use std::sync::Arc;
use tracing::info;

/// Send a raw tagged transaction via eth_sendTransaction
///
/// The node must hold the key for `--from` (or have a default account).
#[derive(Args)]
#[command(group(required_tag_group()))]
pub struct SendCommand {
    /// Recipient address
    #[arg(long)]
    pub to: Address,

    /// Sender address (node-managed account)
    #[arg(long)]
    pub from: Option<Address>,

    /// Amount in wei, decimal or 0x hex
    #[arg(long)]
    pub value: Option<String>,

    /// Existing call data to append the tag to
    #[arg(long)]
    pub data: Option<Bytes>,

    #[command(flatten)]
    pub tag: TagArgs,

    /// Payload appended after the tag
    #[arg(long)]
    pub payload: Option<String>,

    /// Print the request instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Chain RPC URL
    #[arg(long)]
    pub rpc_url: Option<String>,
}

impl SendCommand {
    pub async fn run(&self) -> AppResult<()> {
        let request = self.request()?;
        let suffix = self.tag.tag_and_payload_hex(self.payload.as_deref())?;

        if self.dry_run {
            let wallet = TaggedWallet::new(Arc::new(OfflineSender));
            let prepared = wallet.send_transaction(request).prepare_hex(&suffix)?;
            println!("{}", serde_json::to_string_pretty(&prepared)?);
            return Ok(());
        }

        let rpc_config = rpc_config_with_override(self.rpc_url.as_deref());
        info!("Sending tagged transaction via {}", rpc_config.url);
        let client = EthRpcClient::new(rpc_config).await?;
        let wallet = TaggedWallet::new(Arc::new(client));

        let receipt = wallet.send_transaction(request).hex_tag(&suffix).await?;
        println!("{}", receipt.transaction_hash);
        Ok(())
    }

    fn request(&self) -> AppResult<TransactionRequest> {
        let value = match &self.value {
            Some(raw) => Some(
                parse_wei(raw).ok_or_else(|| {
                    AppError::InvalidData(format!("invalid wei amount '{}'", raw))
                })?,
            ),
            None => None,
        };

        Ok(TransactionRequest {
            from: self.from,
            to: self.to,
            data: self.data.clone(),
            value,
        })
    }
}
