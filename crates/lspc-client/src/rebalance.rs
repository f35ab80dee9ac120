//! Self-rebalance: move every channel's local balance into the largest
//! channel, then close the emptied channels.
//!
//! The transfer and close phases run as separate tasks. The close phase
//! waits on a oneshot the transfer phase fires when it ends; a dropped sender
//! (early return, error or panic) releases it the same way.

use std::sync::Arc;

use tokio::sync::oneshot;

use lspc_core::{
    Channel, ChannelInformation, CoreError, Hop, LnNode, MppRecord, RebalanceConfig, Route,
    MSAT_PER_SAT,
};

use crate::error::ClientError;

/// Blocks added to the current height for the expiry of rebalance hops.
pub const REBALANCE_TIME_LOCK_DELAY: u32 = 40;

/// Close attempts per emptied channel.
pub const CLOSE_ATTEMPTS: usize = 3;

const REBALANCE_MEMO: &str = "rebalance myself";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    /// Channels a circular payment was sent from.
    pub attempted: usize,
    pub succeeded: usize,
    /// Channels whose close was started.
    pub closed: usize,
}

#[derive(Debug, Default)]
struct TransferStats {
    attempted: usize,
    succeeded: usize,
}

pub struct SelfRebalancer {
    node: Arc<dyn LnNode>,
    info: Arc<ChannelInformation>,
    config: RebalanceConfig,
}

impl SelfRebalancer {
    pub fn new(node: Arc<dyn LnNode>, info: Arc<ChannelInformation>, config: RebalanceConfig) -> Self {
        Self { node, info, config }
    }

    /// Run both phases and wait for both.
    ///
    /// A transfer-phase error is returned only after the close phase has
    /// finished too.
    pub async fn run(&self) -> Result<RebalanceReport, ClientError> {
        let channels = self.node.list_channels().await?;
        if channels.len() <= 1 {
            tracing::debug!(channels = channels.len(), "nothing to rebalance");
            return Ok(RebalanceReport::default());
        }

        let (done_tx, done_rx) = oneshot::channel::<()>();

        let transfer = tokio::spawn({
            let node = Arc::clone(&self.node);
            let info = Arc::clone(&self.info);
            async move {
                let result = transfer_phase(node.as_ref(), &info, &channels).await;
                let _ = done_tx.send(());
                result
            }
        });
        let close = tokio::spawn(close_phase(
            Arc::clone(&self.node),
            self.config.clone(),
            done_rx,
        ));

        let transferred = transfer
            .await
            .map_err(|e| ClientError::Task(format!("rebalance transfer: {e}")));
        let closed = close
            .await
            .map_err(|e| ClientError::Task(format!("rebalance close: {e}")))?;
        let stats = transferred??;

        let report = RebalanceReport {
            attempted: stats.attempted,
            succeeded: stats.succeeded,
            closed,
        };
        tracing::info!(?report, "self-rebalance done");
        Ok(report)
    }
}

async fn transfer_phase(
    node: &dyn LnNode,
    info: &ChannelInformation,
    channels: &[Channel],
) -> Result<TransferStats, ClientError> {
    tracing::info!(channels = channels.len(), "rebalance transfer start");

    if let Some(ch) = channels.iter().find(|ch| ch.local_chan_reserve_sat != 0) {
        tracing::error!(chan_id = ch.chan_id, reserve = ch.local_chan_reserve_sat, "local reserve not zero");
        return Err(CoreError::Configuration(format!(
            "channel {} has local reserve {} sat, rebalance requires zero",
            ch.chan_id, ch.local_chan_reserve_sat
        ))
        .into());
    }

    let mut target_idx = 0;
    let mut max_capacity = 0;
    for (idx, ch) in channels.iter().enumerate() {
        tracing::trace!(idx, chan_id = ch.chan_id, capacity = ch.capacity, local = ch.local_balance, "channel");
        if ch.capacity > max_capacity {
            max_capacity = ch.capacity;
            target_idx = idx;
        }
    }
    let total_local: i64 = channels.iter().map(|ch| ch.local_balance).sum();
    let target = &channels[target_idx];
    let headroom = target.local_balance + target.remote_balance - target.remote_chan_reserve_sat as i64;
    if headroom < total_local {
        tracing::warn!(target = target.chan_id, headroom, total_local, "cannot aggregate into largest channel");
        return Ok(TransferStats::default());
    }

    let mut stats = TransferStats::default();
    for (idx, ch) in channels.iter().enumerate() {
        if idx == target_idx || ch.local_balance == 0 {
            continue;
        }
        stats.attempted += 1;
        tracing::info!(chan_id = ch.chan_id, balance = ch.local_balance, "rebalancing channel");
        match pay_into_target(node, info, ch, target).await {
            Ok(true) => stats.succeeded += 1,
            Ok(false) => {}
            Err(e) => tracing::error!(chan_id = ch.chan_id, error = %e, "rebalance payment failed"),
        }
    }

    tracing::info!(attempted = stats.attempted, succeeded = stats.succeeded, "rebalance transfer done");
    Ok(stats)
}

/// Circular payment of `source`'s local balance: out through `source` to
/// the LSP and back in over `target`.
async fn pay_into_target(
    node: &dyn LnNode,
    info: &ChannelInformation,
    source: &Channel,
    target: &Channel,
) -> Result<bool, CoreError> {
    let amount_msat = source.local_balance * MSAT_PER_SAT;
    let invoice = node.add_invoice_simple(amount_msat, REBALANCE_MEMO).await?;
    let node_info = node.get_info().await?;
    tracing::debug!(height = node_info.block_height, "current height");

    let route = circular_route(
        source.chan_id,
        target.remote_chan_id,
        &info.node_pubkey,
        &node_info.identity_pubkey,
        amount_msat,
        node_info.block_height,
        info.time_lock_delta,
        invoice.payment_addr,
    );
    let resp = node.send_to_route_sync(&invoice.r_hash, &route).await?;
    if resp.payment_error.is_empty() {
        tracing::info!(
            chan_id = source.chan_id,
            preimage = %hex::encode(&resp.payment_preimage),
            "rebalance payment succeeded"
        );
        Ok(true)
    } else {
        tracing::error!(chan_id = source.chan_id, error = %resp.payment_error, "rebalance payment error");
        Ok(false)
    }
}

#[allow(clippy::too_many_arguments)]
fn circular_route(
    out_chan_id: u64,
    in_chan_id: u64,
    lsp_node: &str,
    self_node: &str,
    amount_msat: i64,
    height: u32,
    time_lock_delta: u32,
    payment_addr: Vec<u8>,
) -> Route {
    let expiry = height + REBALANCE_TIME_LOCK_DELAY;
    let hops = vec![
        Hop {
            chan_id: out_chan_id,
            amt_to_forward_msat: amount_msat,
            fee_msat: 0,
            expiry,
            pub_key: lsp_node.to_string(),
            tlv_payload: true,
            mpp_record: None,
        },
        Hop {
            chan_id: in_chan_id,
            amt_to_forward_msat: amount_msat,
            fee_msat: 0,
            expiry,
            pub_key: self_node.to_string(),
            tlv_payload: true,
            mpp_record: Some(MppRecord {
                payment_addr,
                total_amt_msat: amount_msat,
            }),
        },
    ];
    Route::new(hops, expiry + time_lock_delta, 0, amount_msat)
}

async fn close_phase(
    node: Arc<dyn LnNode>,
    config: RebalanceConfig,
    done: oneshot::Receiver<()>,
) -> usize {
    if done.await.is_err() {
        tracing::warn!("transfer phase ended without signalling");
    }
    tracing::info!("rebalance close start");
    // let the peers finish revoke_and_ack before reading balances
    tokio::time::sleep(config.settle_delay()).await;

    let channels = match node.list_channels().await {
        Ok(channels) => channels,
        Err(e) => {
            tracing::error!(error = %e, "list channels for close failed");
            return 0;
        }
    };
    if channels.len() <= 1 {
        tracing::debug!(channels = channels.len(), "nothing to close");
        return 0;
    }

    let mut closed = 0;
    for ch in channels.iter().filter(|ch| ch.local_balance == 0) {
        let (txid, index) = match ch.funding_outpoint() {
            Ok(outpoint) => outpoint,
            Err(e) => {
                tracing::error!(channel_point = %ch.channel_point, error = %e, "bad channel point");
                continue;
            }
        };
        if close_with_retry(node.as_ref(), &config, &txid, index).await {
            tracing::info!(channel_point = %ch.channel_point, "channel close started");
            closed += 1;
        }
    }
    tracing::info!(closed, "rebalance close done");
    closed
}

async fn close_with_retry(node: &dyn LnNode, config: &RebalanceConfig, txid: &str, index: u32) -> bool {
    for attempt in 1..=CLOSE_ATTEMPTS {
        match node.close_channel(txid, index, config.close_sat_per_vbyte).await {
            Ok(()) => return true,
            Err(e) if attempt < CLOSE_ATTEMPTS => {
                tracing::debug!(txid, index, attempt, error = %e, "close failed, retrying");
                tokio::time::sleep(config.close_retry_delay()).await;
            }
            Err(e) => {
                tracing::error!(txid, index, attempts = CLOSE_ATTEMPTS, error = %e, "close failed");
            }
        }
    }
    false
}
