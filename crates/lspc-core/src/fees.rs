//! Fee arithmetic. Integer truncation here must match the LSP's own checks
//! exactly, so every division is the plain `i64` floor for non-negative input.

use serde::{Deserialize, Serialize};

use crate::node::Channel;
use crate::types::{ChannelInformation, MSAT_PER_SAT};

/// Share of the commitment fee kept back as margin for `update_fee`, percent.
pub const COMMIT_FEE_MARGIN_PERCENT: i64 = 50;

/// Service fee in satoshis for an on-the-fly channel payment of `amount_sat`.
///
/// Computed in `i128` and saturated at `i64::MAX`, so the fee never drops as
/// the amount grows.
pub fn service_fee_sat(info: &ChannelInformation, amount_sat: i64) -> i64 {
    let fee_msat = i128::from(amount_sat) * i128::from(MSAT_PER_SAT) * i128::from(info.fee_permyriad)
        / 10_000;
    let fee_msat = fee_msat.max(i128::from(info.minimum_fee_msat));
    i64::try_from(fee_msat / i128::from(MSAT_PER_SAT)).unwrap_or(i64::MAX)
}

/// Forwarding fee the LSP charges on its hop for `amount_msat`.
pub fn hop_fee_msat(info: &ChannelInformation, amount_msat: i64) -> i64 {
    info.base_fee_msat + (amount_msat as f64 * info.fee_rate) as i64
}

/// Largest amount (sat) receivable over a single existing channel.
pub fn receivable_max(channels: &[Channel]) -> i64 {
    channels
        .iter()
        .map(|ch| {
            let margin = ch.commit_fee * COMMIT_FEE_MARGIN_PERCENT / 100;
            ch.remote_balance - ch.remote_chan_reserve_sat as i64 - margin
        })
        .fold(0, i64::max)
}

/// Routing policy of the LSP's channel, used for invoice route hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeHint {
    pub fee_base_msat: i64,
    pub fee_proportional_millionths: i64,
    pub time_lock_delta: u32,
}

/// The LSP's routing policy when `peer_node` is the LSP node, `None` otherwise.
pub fn fee_hint(info: &ChannelInformation, peer_node: &[u8]) -> Option<FeeHint> {
    let lsp_node = hex::decode(&info.node_pubkey).ok()?;
    if lsp_node != peer_node {
        return None;
    }
    Some(FeeHint {
        fee_base_msat: info.base_fee_msat,
        fee_proportional_millionths: (info.fee_rate * 1_000_000.0) as i64,
        time_lock_delta: info.time_lock_delta,
    })
}
