use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Deserialize;

use lspc_client::LspClient;
use lspc_swap::RepayData;

#[derive(Subcommand, Debug)]
pub enum SwapCommand {
    /// Generate a preimage, payment hash and refund key pair.
    CreateKeys,
    /// Register a swap and print the address to fund.
    Register(RegisterArgs),
    /// Ask the LSP to pay an invoice against a funded swap.
    Receive(ReceiveArgs),
    /// Sweep matured swap outputs back to an address.
    Repay(RepayArgs),
    /// Re-import a swap script into the node's watch list.
    Reregister(ReregisterArgs),
    /// Blocks until a swap output becomes refundable.
    RefundBlock,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Payment hash (hex).
    #[arg(long)]
    pub payment_hash: String,
    /// Refund public key (hex, compressed).
    #[arg(long)]
    pub refund_pubkey: String,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Payment hash (hex).
    #[arg(long)]
    pub payment_hash: String,
    /// Invoice paying the swap amount.
    #[arg(long)]
    pub invoice: String,
}

#[derive(Args, Debug)]
pub struct RepayArgs {
    /// JSON file with the outputs to sweep.
    #[arg(long)]
    pub inputs: PathBuf,
    /// Destination address.
    #[arg(long)]
    pub address: String,
    /// Wallet label for the transaction.
    #[arg(long, default_value = "")]
    pub label: String,
}

#[derive(Args, Debug)]
pub struct ReregisterArgs {
    /// Redeem script (hex).
    pub script: String,
}

/// One entry of the `--inputs` file of `swap repay`.
#[derive(Deserialize)]
struct RepayInput {
    script: String,
    txid: String,
    index: u32,
    amount_sat: u64,
    refund_privkey: String,
}

impl RepayInput {
    fn into_repay_data(self) -> anyhow::Result<RepayData> {
        let key = hex::decode(&self.refund_privkey).context("refund_privkey is not hex")?;
        let refund_privkey: [u8; 32] = key
            .as_slice()
            .try_into()
            .map_err(|_| anyhow::anyhow!("refund_privkey must be 32 bytes"))?;
        Ok(RepayData {
            script: hex::decode(&self.script).context("script is not hex")?,
            txid: self.txid,
            index: self.index,
            amount_sat: self.amount_sat,
            refund_privkey,
        })
    }
}

fn load_inputs(path: &PathBuf) -> anyhow::Result<Vec<RepayData>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let inputs: Vec<RepayInput> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    inputs.into_iter().map(RepayInput::into_repay_data).collect()
}

pub async fn run(client: &LspClient, cmd: &SwapCommand) -> anyhow::Result<()> {
    match cmd {
        SwapCommand::CreateKeys => {
            let keys = client.submarine_create_keys();
            let out = serde_json::json!({
                "preimage": hex::encode(keys.preimage),
                "payment_hash": hex::encode(keys.payment_hash),
                "refund_privkey": hex::encode(keys.refund_privkey),
                "refund_pubkey": hex::encode(keys.refund_pubkey),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        SwapCommand::Register(args) => {
            let hash = hex::decode(&args.payment_hash).context("payment hash is not hex")?;
            let refund = hex::decode(&args.refund_pubkey).context("refund pubkey is not hex")?;
            let swap = client.submarine_register(&hash, &refund).await?;
            let out = serde_json::json!({
                "address": swap.script_address,
                "script": hex::encode(&swap.script),
                "htlc_pubkey": hex::encode(&swap.htlc_pubkey),
                "height": swap.height,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        SwapCommand::Receive(args) => {
            let hash = hex::decode(&args.payment_hash).context("payment hash is not hex")?;
            client.submarine_receive(&hash, &args.invoice).await?;
            println!("Swap payment accepted by the LSP");
        }
        SwapCommand::Repay(args) => {
            let inputs = load_inputs(&args.inputs)?;
            let txid = client
                .submarine_repayment(&inputs, &args.address, &args.label)
                .await?;
            println!("{txid}");
        }
        SwapCommand::Reregister(args) => {
            let script = hex::decode(&args.script).context("script is not hex")?;
            let address = client.submarine_reregister(&script).await?;
            println!("{address}");
        }
        SwapCommand::RefundBlock => {
            println!("{}", client.submarine_refund_block());
        }
    }
    Ok(())
}
