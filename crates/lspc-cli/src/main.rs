//! lspc: command-line front end of the LSP client.
//!
//! Subcommands: init, info, ping, fee, receive-max, register, pay, swap,
//! rebalance, user-info, report, open-channel, integrity.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lspc_client::LspClient;
use lspc_core::{ClientConfig, LoggingConfig};

/// lspc: liquidity and swaps from a Lightning Service Provider.
#[derive(Parser, Debug)]
#[command(name = "lspc", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "lspc.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Handshake with the LSP and show its channel terms.
    Info,
    /// Check that the LSP answers.
    Ping(commands::info::PingArgs),
    /// Quote the LSP fee for receiving an amount over a new channel.
    Fee(commands::info::FeeArgs),
    /// Largest amount an existing channel can receive.
    ReceiveMax,
    /// Register an on-the-fly channel payment and print the invoice.
    Register(commands::pay::RegisterArgs),
    /// Pay an invoice over LSP-supplied routes.
    Pay(commands::pay::PayArgs),
    /// Submarine swap operations.
    #[command(subcommand)]
    Swap(commands::swap::SwapCommand),
    /// Move all local balance into the largest channel and close the rest.
    Rebalance,
    /// Register a contact mail address with the LSP.
    UserInfo(commands::account::UserInfoArgs),
    /// Send a diagnostic report to the LSP.
    Report(commands::account::ReportArgs),
    /// Ask the LSP to open a channel to this node.
    OpenChannel,
    /// Device integrity attestation.
    #[command(subcommand)]
    Integrity(commands::account::IntegrityCommand),
}

fn init_tracing(logging: &LoggingConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init(args) = &cli.command {
        return commands::init::run(args, &cli.config);
    }

    let config = ClientConfig::load(&cli.config)?;
    init_tracing(&config.logging, cli.log_level.as_deref());
    tracing::debug!(config = %cli.config.display(), "lspc v{}", env!("CARGO_PKG_VERSION"));

    let client = LspClient::from_config(config)?;

    match &cli.command {
        Commands::Init(_) => Ok(()),
        Commands::Info => commands::info::run_info(&client).await,
        Commands::Ping(args) => commands::info::run_ping(&client, args).await,
        Commands::Fee(args) => commands::info::run_fee(&client, args).await,
        Commands::ReceiveMax => commands::info::run_receive_max(&client).await,
        Commands::Register(args) => commands::pay::run_register(&client, args).await,
        Commands::Pay(args) => commands::pay::run_pay(&client, args).await,
        Commands::Swap(cmd) => commands::swap::run(&client, cmd).await,
        Commands::Rebalance => commands::rebalance::run(&client).await,
        Commands::UserInfo(args) => commands::account::run_user_info(&client, args).await,
        Commands::Report(args) => commands::account::run_report(&client, args).await,
        Commands::OpenChannel => commands::account::run_open_channel(&client).await,
        Commands::Integrity(cmd) => commands::account::run_integrity(&client, cmd).await,
    }
}
