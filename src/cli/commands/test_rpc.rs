use crate::cli::commands::rpc_config_with_override;
use crate::errors::{AppError, AppResult};
use crate::rpc::{BlockSource, EthRpcClient};
use clap::Args;
use tracing::{error, info};

/// Test chain RPC connectivity
#[derive(Args)]
pub struct TestRpcCommand {
    /// Chain RPC URL
    #[arg(long)]
    pub rpc_url: Option<String>,
}

impl TestRpcCommand {
    pub async fn run(&self) -> AppResult<()> {
        info!("=== Testing Chain RPC Connection ===");

        let rpc_config = rpc_config_with_override(self.rpc_url.as_deref());
        info!("Testing connection to: {}", rpc_config.url);

        match EthRpcClient::new(rpc_config).await {
            Ok(client) => {
                info!("RPC connection successful!");

                let chain_id = client.test_connection().await.map_err(|e| {
                    error!("RPC connection test failed: {}", e);
                    AppError::Config(format!("RPC test failed: {}", e))
                })?;
                let head = client.block_number().await?;

                println!("Chain RPC connection test PASSED");
                println!("Chain id: {}", chain_id);
                println!("Head block: {}", head);
            }
            Err(e) => {
                error!("Failed to create RPC client: {}", e);
                println!("Chain RPC connection test FAILED");
                println!("Error: {}", e);
                println!("\nTroubleshooting tips:");
                println!("1. Check that the node is running");
                println!("2. Verify the RPC URL is correct");
                println!("3. Ensure the HTTP JSON-RPC interface is enabled");

                return Err(AppError::Config(format!(
                    "RPC client creation failed: {}",
                    e
                )));
            }
        }

        Ok(())
    }
}
