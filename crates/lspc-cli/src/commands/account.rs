use clap::{Args, Subcommand, ValueEnum};

use lspc_client::LspClient;
use lspc_core::proto::lspd::ReportLevel;

#[derive(Args, Debug)]
pub struct UserInfoArgs {
    /// Contact mail address.
    pub mail_address: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Level {
    Normal,
    Notify,
    Critical,
}

impl From<Level> for ReportLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Normal => ReportLevel::Normal,
            Level::Notify => ReportLevel::Notify,
            Level::Critical => ReportLevel::Critical,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Report category.
    #[arg(long)]
    pub category: String,
    #[arg(long, value_enum, default_value = "normal")]
    pub level: Level,
    /// Report text.
    pub message: String,
}

#[derive(Subcommand, Debug)]
pub enum IntegrityCommand {
    /// Fetch a nonce for an attestation of device `id`.
    Nonce {
        id: String,
    },
    /// Submit an attestation token for verification.
    Verify {
        id: String,
        token: String,
    },
}

pub async fn run_user_info(client: &LspClient, args: &UserInfoArgs) -> anyhow::Result<()> {
    client.register_user_info(&args.mail_address).await?;
    println!("Registered {}", args.mail_address);
    Ok(())
}

pub async fn run_report(client: &LspClient, args: &ReportArgs) -> anyhow::Result<()> {
    client
        .report_message(&args.category, args.level.into(), &args.message)
        .await?;
    println!("Report sent");
    Ok(())
}

pub async fn run_open_channel(client: &LspClient) -> anyhow::Result<()> {
    client.request_open_channel().await?;
    println!("Channel open requested from {}", client.hub_node_string()?);
    Ok(())
}

pub async fn run_integrity(client: &LspClient, cmd: &IntegrityCommand) -> anyhow::Result<()> {
    match cmd {
        IntegrityCommand::Nonce { id } => {
            println!("{}", client.integrity_nonce(id).await?);
        }
        IntegrityCommand::Verify { id, token } => {
            let result = client.integrity_verify(id, token).await?;
            println!("{result:?}");
        }
    }
    Ok(())
}
