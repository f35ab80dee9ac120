use clap::Args;

use lspc_client::LspClient;

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Nonce echoed back by the LSP.
    #[arg(long, default_value_t = 1)]
    pub nonce: i32,
}

#[derive(Args, Debug)]
pub struct FeeArgs {
    /// Amount to receive, in satoshis.
    pub amount_sat: i64,
}

/// Handshake and print the cached channel terms.
pub async fn run_info(client: &LspClient) -> anyhow::Result<()> {
    client.ping(0).await?;

    println!("LSP Channel Terms");
    println!("=================");
    println!("Version:        {}", client.version()?);
    println!("Hub node:       {}", client.hub_node_string()?);
    println!("Fee (permyriad): {}", client.fee_permyriad()?);
    Ok(())
}

pub async fn run_ping(client: &LspClient, args: &PingArgs) -> anyhow::Result<()> {
    let nonce = client.ping(args.nonce).await?;
    println!("pong {nonce}");
    Ok(())
}

pub async fn run_fee(client: &LspClient, args: &FeeArgs) -> anyhow::Result<()> {
    client.ping(0).await?;
    let fee = client.payment_fee(args.amount_sat)?;
    println!("Amount:  {} sat", args.amount_sat);
    println!("Fee:     {fee} sat");
    println!("Receive: {} sat", args.amount_sat - fee);
    Ok(())
}

pub async fn run_receive_max(client: &LspClient) -> anyhow::Result<()> {
    let max = client.receive_max().await?;
    println!("{max}");
    Ok(())
}
