use crate::cli::commands::{rpc_config_with_override, TagArgs};
use crate::config::AppConfig;
use crate::detector::DetectorBuilder;
use crate::errors::{AppError, AppResult};
use crate::rpc::{BlockSource, EthRpcClient};
use crate::types::TaggedEvent;
use alloy::primitives::Address;
use clap::Args;
use std::sync::Arc;
use tracing::{error, info};

/// Stream tagged transactions from new blocks as JSON lines
#[derive(Args)]
pub struct WatchCommand {
    /// Tag to watch for; falls back to detector.tag when none is given
    #[command(flatten)]
    pub tag: TagArgs,

    /// Payload keys to extract, comma separated
    #[arg(long, value_delimiter = ',')]
    pub keys: Vec<String>,

    /// Only report transactions whose payload contains this key (repeatable)
    #[arg(long = "require-key")]
    pub require_keys: Vec<String>,

    /// Only report transactions sent from this address
    #[arg(long)]
    pub from: Option<Address>,

    /// Suppress detector progress logging
    #[arg(long)]
    pub silent: bool,

    /// Head polling interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Scan from this block up to the current head before streaming
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Chain RPC URL
    #[arg(long)]
    pub rpc_url: Option<String>,
}

impl WatchCommand {
    pub async fn run(&self) -> AppResult<()> {
        let mut detector_config = AppConfig::get_defaults().detector;
        if let Some(tag) = &self.tag.tag {
            detector_config.tag = tag.clone();
        }
        // Hex and digest tags need not be UTF-8, so they bypass the text tag
        let hex_tag = match (&self.tag.tag, self.tag.is_empty()) {
            (None, false) => Some(self.tag.tag_hex()?),
            _ => None,
        };
        if !self.keys.is_empty() {
            detector_config.data_keys = self.keys.clone();
        }
        if self.silent {
            detector_config.silent = true;
        }
        if let Some(interval) = self.poll_interval_ms {
            detector_config.poll_interval_ms = interval;
        }
        if detector_config.tag.is_empty() && hex_tag.is_none() {
            return Err(AppError::Config(
                "No tag to watch; pass --tag, --hex-tag or --digest-of, or set detector.tag"
                    .to_string(),
            ));
        }

        let rpc_config = rpc_config_with_override(self.rpc_url.as_deref());
        info!("Connecting to {}", rpc_config.url);
        let client = Arc::new(EthRpcClient::new(rpc_config).await?);

        let mut builder = DetectorBuilder::from_config(client.clone(), &detector_config);
        if let Some(hex_tag) = &hex_tag {
            builder = builder.hex_tag(hex_tag)?;
        }
        for key in &self.require_keys {
            builder = builder.tag_key_filter(key.clone());
        }
        if let Some(from) = self.from {
            builder = builder.filter(move |tx, _| tx.from == from);
        }

        let mut detector = builder.build();

        if let Some(from_block) = self.from_block {
            let head = client.block_number().await?;
            info!("Backfilling blocks {} to {}", from_block, head);
            let concurrency = client.get_concurrent_limit();
            let emitted = detector
                .scan_range(from_block..=head, concurrency, &mut print_event)
                .await;
            info!("Backfill complete: {} tagged transactions", emitted);
            detector.resume_after(head);
        }

        let handle = detector.start(print_event);

        tokio::signal::ctrl_c().await?;
        info!("Interrupted, stopping detector");
        handle.stop().await;
        Ok(())
    }
}

/// One JSON object per line on stdout
fn print_event(event: TaggedEvent) {
    match serde_json::to_string(&event) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialise event {}: {}", event.tx_hash, e),
    }
}
