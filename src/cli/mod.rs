use crate::errors::AppResult;
use clap::{Parser, Subcommand};

pub mod commands;

/// Call-data tag embedding and block-scanning detector
#[derive(Parser)]
#[command(name = "ghosttag")]
#[command(about = "Embed tags in transaction call data and watch blocks for them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Stream tagged transactions from new blocks
    Watch(commands::watch::WatchCommand),
    /// Print tagged call data without sending anything
    Encode(commands::encode::EncodeCommand),
    /// Locate a tag in call data and decode the payload after it
    Decode(commands::decode::DecodeCommand),
    /// Send a raw tagged transaction via eth_sendTransaction
    Send(commands::send::SendCommand),
    /// Test chain RPC connectivity
    TestRpc(commands::test_rpc::TestRpcCommand),
}

pub async fn run() -> AppResult<()> {
    // Initialise tracing subscriber to capture info!() macros
    // Uses RUST_LOG environment variable (defaults to "info" if not set)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(command) => command.run().await,
        Commands::Encode(command) => command.run(),
        Commands::Decode(command) => command.run(),
        Commands::Send(command) => command.run().await,
        Commands::TestRpc(command) => command.run().await,
    }
}
