use clap::Args;

use lspc_client::LspClient;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Amount to receive, in satoshis.
    pub amount_sat: i64,

    /// Invoice description.
    #[arg(long, default_value = "")]
    pub memo: String,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// BOLT11 invoice.
    pub invoice: String,

    /// Maximum routing fee, in satoshis.
    #[arg(long, default_value_t = 100)]
    pub fee_limit_sat: i64,

    /// Amount for zero-amount invoices, in satoshis.
    #[arg(long, default_value_t = 0)]
    pub amount_sat: i64,
}

pub async fn run_register(client: &LspClient, args: &RegisterArgs) -> anyhow::Result<()> {
    let fee = client.payment_fee(args.amount_sat).ok();
    let invoice = client.register_payment(args.amount_sat, &args.memo).await?;
    if let Some(fee) = fee {
        eprintln!("LSP fee: {fee} sat");
    }
    println!("{invoice}");
    Ok(())
}

pub async fn run_pay(client: &LspClient, args: &PayArgs) -> anyhow::Result<()> {
    let outcome = client
        .query_route_payment(&args.invoice, args.fee_limit_sat, args.amount_sat)
        .await?;

    println!("Payment hash: {}", outcome.payment_hash);
    println!("Status:       {:?}", outcome.status);
    println!("Attempts:     {}", outcome.attempts);
    if !outcome.is_success() {
        println!("Reason:       {:?}", outcome.failure_reason);
        anyhow::bail!("payment did not succeed");
    }
    Ok(())
}
