use lspc_client::LspClient;

pub async fn run(client: &LspClient) -> anyhow::Result<()> {
    let report = client.self_rebalance().await?;
    println!("Payments attempted: {}", report.attempted);
    println!("Payments succeeded: {}", report.succeeded);
    println!("Channels closed:    {}", report.closed);
    Ok(())
}
