use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::proto::{lnrpc, lspd};

/// Millisatoshis per satoshi.
pub const MSAT_PER_SAT: i64 = 1000;

/// Length of a compressed secp256k1 public key.
pub const PUBKEY_LEN: usize = 33;

/// Channel terms published by the LSP.
///
/// Fetched once per session and never mutated; a refresh replaces the whole
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInformation {
    pub name: String,
    /// Long-term key the LSP decrypts requests with (33-byte compressed).
    pub lsp_pubkey: Vec<u8>,
    /// Hex node id of the LSP's Lightning node.
    pub node_pubkey: String,
    pub host: String,
    pub channel_capacity: i64,
    pub target_conf: i32,
    pub base_fee_msat: i64,
    /// Proportional forwarding fee as a fraction of the amount.
    pub fee_rate: f64,
    pub time_lock_delta: u32,
    /// Service fee for on-the-fly channel payments, in parts per ten thousand.
    pub fee_permyriad: i64,
    pub minimum_fee_msat: i64,
    pub max_inactive_duration: i64,
    pub version: String,
}

impl ChannelInformation {
    /// `pubkey@host` connection string of the LSP node.
    pub fn hub_node_string(&self) -> String {
        format!("{}@{}", self.node_pubkey, self.host)
    }

    /// Raw bytes of the LSP node id.
    pub fn node_pubkey_bytes(&self) -> Result<Vec<u8>, CoreError> {
        hex::decode(&self.node_pubkey)
            .map_err(|e| CoreError::Protocol(format!("LSP node pubkey is not hex: {e}")))
    }
}

impl TryFrom<lspd::ChannelInformationReply> for ChannelInformation {
    type Error = CoreError;

    fn try_from(reply: lspd::ChannelInformationReply) -> Result<Self, Self::Error> {
        if reply.lsp_pubkey.len() != PUBKEY_LEN {
            return Err(CoreError::Protocol(format!(
                "LSP pubkey must be {PUBKEY_LEN} bytes, got {}",
                reply.lsp_pubkey.len()
            )));
        }
        Ok(Self {
            name: reply.name,
            lsp_pubkey: reply.lsp_pubkey,
            node_pubkey: reply.pubkey,
            host: reply.host,
            channel_capacity: reply.channel_capacity,
            target_conf: reply.target_conf,
            base_fee_msat: reply.base_fee_msat,
            fee_rate: reply.fee_rate,
            time_lock_delta: reply.time_lock_delta,
            fee_permyriad: reply.channel_fee_permyriad,
            minimum_fee_msat: reply.channel_minimum_fee_msat,
            max_inactive_duration: reply.max_inactive_duration,
            version: reply.version,
        })
    }
}

/// Directed edge `from -> to` that failed to forward a payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePair {
    pub from: Vec<u8>,
    pub to: Vec<u8>,
}

impl NodePair {
    /// Build a pair from two hex node ids.
    pub fn from_hex(from: &str, to: &str) -> Result<Self, CoreError> {
        let from = hex::decode(from)
            .map_err(|e| CoreError::InvalidInput(format!("node pair 'from': {e}")))?;
        let to =
            hex::decode(to).map_err(|e| CoreError::InvalidInput(format!("node pair 'to': {e}")))?;
        Ok(Self { from, to })
    }
}

impl From<&NodePair> for lspd::NodePair {
    fn from(pair: &NodePair) -> Self {
        Self {
            from: pair.from.clone(),
            to: pair.to.clone(),
        }
    }
}

/// Multi-path payment record carried by the final hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MppRecord {
    pub payment_addr: Vec<u8>,
    pub total_amt_msat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub chan_id: u64,
    pub amt_to_forward_msat: i64,
    pub fee_msat: i64,
    pub expiry: u32,
    /// Hex node id of the hop's receiving node.
    pub pub_key: String,
    pub tlv_payload: bool,
    pub mpp_record: Option<MppRecord>,
}

/// A Lightning route with its aggregate totals.
///
/// Totals are private and only move together with the hop list, so splicing
/// a hop in keeps them consistent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Route {
    hops: Vec<Hop>,
    total_time_lock: u32,
    total_fees_msat: i64,
    total_amt_msat: i64,
}

impl Route {
    pub fn new(hops: Vec<Hop>, total_time_lock: u32, total_fees_msat: i64, total_amt_msat: i64) -> Self {
        Self {
            hops,
            total_time_lock,
            total_fees_msat,
            total_amt_msat,
        }
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn total_time_lock(&self) -> u32 {
        self.total_time_lock
    }

    pub fn total_fees_msat(&self) -> i64 {
        self.total_fees_msat
    }

    pub fn total_amt_msat(&self) -> i64 {
        self.total_amt_msat
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Splice a `self -> first node` hop in front of the route.
    ///
    /// The new hop forwards the previous total amount and expires at the
    /// previous total time lock; totals grow by `fee_msat` and
    /// `time_lock_delta`. The route is left untouched if a total overflows.
    pub fn prepend_hop(
        &mut self,
        chan_id: u64,
        pub_key: String,
        fee_msat: i64,
        time_lock_delta: u32,
    ) -> Result<(), CoreError> {
        let overflow = |what: &str| CoreError::Protocol(format!("route {what} overflows"));
        let total_amt_msat = self
            .total_amt_msat
            .checked_add(fee_msat)
            .ok_or_else(|| overflow("amount"))?;
        let total_fees_msat = self
            .total_fees_msat
            .checked_add(fee_msat)
            .ok_or_else(|| overflow("fees"))?;
        let total_time_lock = self
            .total_time_lock
            .checked_add(time_lock_delta)
            .ok_or_else(|| overflow("time lock"))?;

        let hop = Hop {
            chan_id,
            amt_to_forward_msat: self.total_amt_msat,
            fee_msat,
            expiry: self.total_time_lock,
            pub_key,
            tlv_payload: true,
            mpp_record: None,
        };
        self.hops.insert(0, hop);
        self.total_amt_msat = total_amt_msat;
        self.total_fees_msat = total_fees_msat;
        self.total_time_lock = total_time_lock;
        Ok(())
    }

    /// Attach an MPP record to the final hop. Returns `false` on an empty route.
    pub fn attach_mpp(&mut self, record: MppRecord) -> bool {
        match self.hops.last_mut() {
            Some(last) => {
                last.mpp_record = Some(record);
                true
            }
            None => false,
        }
    }
}

impl From<lnrpc::MppRecord> for MppRecord {
    fn from(r: lnrpc::MppRecord) -> Self {
        Self {
            payment_addr: r.payment_addr,
            total_amt_msat: r.total_amt_msat,
        }
    }
}

impl From<&MppRecord> for lnrpc::MppRecord {
    fn from(r: &MppRecord) -> Self {
        Self {
            payment_addr: r.payment_addr.clone(),
            total_amt_msat: r.total_amt_msat,
        }
    }
}

impl From<lnrpc::Hop> for Hop {
    fn from(h: lnrpc::Hop) -> Self {
        Self {
            chan_id: h.chan_id,
            amt_to_forward_msat: h.amt_to_forward_msat,
            fee_msat: h.fee_msat,
            expiry: h.expiry,
            pub_key: h.pub_key,
            tlv_payload: h.tlv_payload,
            mpp_record: h.mpp_record.map(MppRecord::from),
        }
    }
}

impl From<&Hop> for lnrpc::Hop {
    fn from(h: &Hop) -> Self {
        Self {
            chan_id: h.chan_id,
            expiry: h.expiry,
            pub_key: h.pub_key.clone(),
            tlv_payload: h.tlv_payload,
            mpp_record: h.mpp_record.as_ref().map(lnrpc::MppRecord::from),
            amt_to_forward_msat: h.amt_to_forward_msat,
            fee_msat: h.fee_msat,
        }
    }
}

impl From<lnrpc::Route> for Route {
    fn from(r: lnrpc::Route) -> Self {
        Self {
            hops: r.hops.into_iter().map(Hop::from).collect(),
            total_time_lock: r.total_time_lock,
            total_fees_msat: r.total_fees_msat,
            total_amt_msat: r.total_amt_msat,
        }
    }
}

impl From<&Route> for lnrpc::Route {
    fn from(r: &Route) -> Self {
        Self {
            total_time_lock: r.total_time_lock,
            hops: r.hops.iter().map(lnrpc::Hop::from).collect(),
            total_fees_msat: r.total_fees_msat,
            total_amt_msat: r.total_amt_msat,
        }
    }
}

/// Final payment status, numbered as the Lightning node reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unknown = 0,
    InFlight = 1,
    Succeeded = 2,
    Failed = 3,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Unknown => "UNKNOWN",
            PaymentStatus::InFlight => "IN_FLIGHT",
            PaymentStatus::Succeeded => "SUCCEEDED",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Why a payment sequence did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentFailureReason {
    #[default]
    None = 0,
    Timeout = 1,
    NoRoute = 2,
    Error = 3,
    IncorrectPaymentDetails = 4,
    InsufficientBalance = 5,
}

impl fmt::Display for PaymentFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentFailureReason::None => "FAILURE_REASON_NONE",
            PaymentFailureReason::Timeout => "FAILURE_REASON_TIMEOUT",
            PaymentFailureReason::NoRoute => "FAILURE_REASON_NO_ROUTE",
            PaymentFailureReason::Error => "FAILURE_REASON_ERROR",
            PaymentFailureReason::IncorrectPaymentDetails => {
                "FAILURE_REASON_INCORRECT_PAYMENT_DETAILS"
            }
            PaymentFailureReason::InsufficientBalance => "FAILURE_REASON_INSUFFICIENT_BALANCE",
        };
        write!(f, "{s}")
    }
}

impl PaymentFailureReason {
    /// Parse the node's textual form (`FAILURE_REASON_NO_ROUTE`, ...).
    pub fn from_name(name: &str) -> Self {
        match name {
            "FAILURE_REASON_TIMEOUT" => Self::Timeout,
            "FAILURE_REASON_NO_ROUTE" => Self::NoRoute,
            "FAILURE_REASON_ERROR" => Self::Error,
            "FAILURE_REASON_INCORRECT_PAYMENT_DETAILS" => Self::IncorrectPaymentDetails,
            "FAILURE_REASON_INSUFFICIENT_BALANCE" => Self::InsufficientBalance,
            _ => Self::None,
        }
    }
}
