use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{PaymentFailureReason, PaymentStatus, Route};

/// Identity and chain tip of the local node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Hex node id.
    pub identity_pubkey: String,
    pub block_height: u32,
    pub block_hash: String,
    /// `mainnet`, `testnet`, `signet` or `regtest`.
    pub network: String,
}

/// An active channel as listed by the local node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Channel {
    pub chan_id: u64,
    /// Channel id the peer knows this channel by.
    pub remote_chan_id: u64,
    pub remote_pubkey: String,
    /// `txid:index` of the funding output.
    pub channel_point: String,
    pub capacity: i64,
    pub local_balance: i64,
    pub remote_balance: i64,
    pub commit_fee: i64,
    pub local_chan_reserve_sat: u64,
    pub remote_chan_reserve_sat: u64,
}

impl Channel {
    /// Split the channel point into funding txid and output index.
    pub fn funding_outpoint(&self) -> Result<(String, u32), CoreError> {
        let (txid, index) = self.channel_point.split_once(':').ok_or_else(|| {
            CoreError::InvalidInput(format!("bad channel point: {}", self.channel_point))
        })?;
        let index = index.parse::<u32>().map_err(|e| {
            CoreError::InvalidInput(format!("bad channel point index {index}: {e}"))
        })?;
        Ok((txid.to_string(), index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcFailure {
    pub code: String,
    /// Index in the route of the node that reported the failure.
    pub failure_source_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcAttempt {
    pub route: Route,
    pub failure: Option<HtlcFailure>,
}

/// Historical payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Hex payment hash.
    pub payment_hash: String,
    pub status: PaymentStatus,
    pub failure_reason: PaymentFailureReason,
    pub htlcs: Vec<HtlcAttempt>,
}

/// Decoded BOLT11 payment request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayReq {
    pub destination: String,
    pub payment_hash: String,
    pub num_msat: i64,
    pub num_satoshis: i64,
    /// Creation time, unix seconds.
    pub timestamp: i64,
    /// Validity after `timestamp`, seconds.
    pub expiry: i64,
    pub payment_addr: Vec<u8>,
}

/// Result of a synchronous send-to-route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SendResponse {
    /// Empty on success.
    pub payment_error: String,
    pub payment_preimage: Vec<u8>,
    pub payment_hash: Vec<u8>,
}

/// Route hint pointing at a (possibly not yet existing) channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopHint {
    pub node_id: String,
    pub chan_id: u64,
    pub fee_base_msat: u32,
    pub fee_proportional_millionths: u32,
    pub cltv_expiry_delta: u32,
}

/// How the node stores an invoice created with an explicit preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceMode {
    /// Stored and settleable; usable for routing.
    Register,
    /// Only encoded and returned; not a multipath invoice.
    CreateOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub amount_sat: i64,
    pub preimage: Vec<u8>,
    pub memo: String,
    pub route_hint: Option<HopHint>,
    pub payment_addr: Option<Vec<u8>>,
    pub mode: InvoiceMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddedInvoice {
    pub payment_request: String,
    pub r_hash: Vec<u8>,
    pub payment_addr: Vec<u8>,
}

/// The local Lightning node as seen by the LSP client: only the operations
/// the engine calls.
#[async_trait]
pub trait LnNode: Send + Sync {
    async fn get_info(&self) -> Result<NodeInfo, CoreError>;

    /// Active channels, in the node's listing order.
    async fn list_channels(&self) -> Result<Vec<Channel>, CoreError>;

    async fn list_payments(&self) -> Result<Vec<Payment>, CoreError>;

    async fn add_invoice(&self, req: InvoiceRequest) -> Result<AddedInvoice, CoreError>;

    /// Plain invoice with a node-generated preimage.
    async fn add_invoice_simple(&self, amount_msat: i64, memo: &str) -> Result<AddedInvoice, CoreError>;

    async fn decode_pay_req(&self, invoice: &str) -> Result<PayReq, CoreError>;

    /// Watch a P2WSH script from the given block on; returns its address.
    async fn add_watch_script(
        &self,
        script: &[u8],
        block_hash: &str,
        block_height: u32,
    ) -> Result<String, CoreError>;

    async fn publish_transaction(&self, raw_tx: &[u8], label: &str) -> Result<(), CoreError>;

    async fn query_routes(
        &self,
        pubkey: &str,
        amount_msat: i64,
        fee_limit_msat: i64,
    ) -> Result<Vec<Route>, CoreError>;

    async fn send_to_route_sync(
        &self,
        payment_hash: &[u8],
        route: &Route,
    ) -> Result<SendResponse, CoreError>;

    async fn close_channel(
        &self,
        funding_txid: &str,
        output_index: u32,
        sat_per_vbyte: u64,
    ) -> Result<(), CoreError>;
}
