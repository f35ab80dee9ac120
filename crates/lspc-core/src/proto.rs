//! Wire messages exchanged with the LSP and the subset of `lnrpc` route
//! messages that travel inside them.
//!
//! The messages are declared with `prost` derives directly so the crate needs
//! no protoc at build time. Field tags follow the LSP's published schema.

/// Messages of the `lspdrpc.LightningService` API.
pub mod lspd {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Encrypted {
        #[prost(bytes = "vec", tag = "1")]
        pub data: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ChannelInformationRequest {
        /// Hex node id of the requesting node.
        #[prost(string, tag = "1")]
        pub pubkey: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ChannelInformationReply {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub pubkey: String,
        #[prost(string, tag = "3")]
        pub host: String,
        #[prost(int64, tag = "4")]
        pub channel_capacity: i64,
        #[prost(int32, tag = "5")]
        pub target_conf: i32,
        #[prost(int64, tag = "6")]
        pub base_fee_msat: i64,
        #[prost(double, tag = "7")]
        pub fee_rate: f64,
        #[prost(uint32, tag = "8")]
        pub time_lock_delta: u32,
        #[prost(int64, tag = "9")]
        pub channel_fee_permyriad: i64,
        #[prost(bytes = "vec", tag = "10")]
        pub lsp_pubkey: Vec<u8>,
        #[prost(int64, tag = "11")]
        pub max_inactive_duration: i64,
        #[prost(int64, tag = "12")]
        pub channel_minimum_fee_msat: i64,
        #[prost(string, tag = "13")]
        pub version: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PingRequest {
        #[prost(int32, tag = "1")]
        pub nonce: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PingReply {
        #[prost(int32, tag = "1")]
        pub nonce: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PaymentInformation {
        #[prost(bytes = "vec", tag = "1")]
        pub payment_hash: Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub payment_secret: Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub destination: Vec<u8>,
        #[prost(int64, tag = "4")]
        pub incoming_amount_msat: i64,
        #[prost(int64, tag = "5")]
        pub outgoing_amount_msat: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterPaymentRequest {
        #[prost(string, tag = "1")]
        pub lsp_id: String,
        /// Encrypted [`PaymentInformation`].
        #[prost(bytes = "vec", tag = "3")]
        pub blob: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterPaymentReply {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterSubmarineRequest {
        #[prost(bytes = "vec", tag = "1")]
        pub encrypt_pubkey: Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub payment_hash: Vec<u8>,
        #[prost(bytes = "vec", tag = "3")]
        pub repay_pubkey: Vec<u8>,
        #[prost(bytes = "vec", tag = "4")]
        pub destination: Vec<u8>,
        #[prost(int32, tag = "5")]
        pub swap_script_version: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterSubmarineReply {
        #[prost(bytes = "vec", tag = "1")]
        pub htlc_pubkey: Vec<u8>,
        #[prost(string, tag = "2")]
        pub script_address: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReceiveSubmarineRequest {
        #[prost(bytes = "vec", tag = "1")]
        pub payment_hash: Vec<u8>,
        #[prost(string, tag = "2")]
        pub invoice: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReceiveSubmarineReply {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NodePair {
        #[prost(bytes = "vec", tag = "1")]
        pub from: Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub to: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct QueryRoutesRequest {
        #[prost(bytes = "vec", tag = "1")]
        pub encrypt_pubkey: Vec<u8>,
        #[prost(string, tag = "2")]
        pub invoice: String,
        #[prost(message, repeated, tag = "3")]
        pub ignored_pairs: Vec<NodePair>,
        #[prost(int64, tag = "4")]
        pub amount: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterUserInfoRequest {
        #[prost(string, tag = "1")]
        pub mail_address: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RegisterUserInfoReply {}

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ReportLevel {
        Normal = 0,
        Notify = 1,
        Critical = 2,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReportRequest {
        #[prost(string, tag = "1")]
        pub category: String,
        #[prost(enumeration = "ReportLevel", tag = "2")]
        pub level: i32,
        #[prost(string, tag = "3")]
        pub message: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ReportReply {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct OpenChannelRequest {
        #[prost(string, tag = "1")]
        pub pubkey: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct OpenChannelReply {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct IntegrityNonceRequest {
        #[prost(bytes = "vec", tag = "1")]
        pub encrypt_pubkey: Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        pub pubkey: Vec<u8>,
        #[prost(string, tag = "3")]
        pub id: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct IntegrityNonceReply {
        #[prost(string, tag = "1")]
        pub nonce: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct IntegrityVerifyRequest {
        #[prost(bytes = "vec", tag = "1")]
        pub pubkey: Vec<u8>,
        #[prost(string, tag = "2")]
        pub token: String,
        #[prost(string, tag = "3")]
        pub id: String,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum IntegrityResult {
        None = 0,
        Ok = 1,
        Ng = 2,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct IntegrityVerifyReply {
        #[prost(enumeration = "IntegrityResult", tag = "1")]
        pub result: i32,
    }
}

/// Route messages in `lnrpc` layout, as returned by the LSP's route query.
pub mod lnrpc {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MppRecord {
        #[prost(int64, tag = "10")]
        pub total_amt_msat: i64,
        #[prost(bytes = "vec", tag = "11")]
        pub payment_addr: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Hop {
        #[prost(uint64, tag = "1")]
        pub chan_id: u64,
        #[prost(uint32, tag = "5")]
        pub expiry: u32,
        #[prost(string, tag = "8")]
        pub pub_key: String,
        #[prost(bool, tag = "9")]
        pub tlv_payload: bool,
        #[prost(message, optional, tag = "10")]
        pub mpp_record: Option<MppRecord>,
        #[prost(int64, tag = "6")]
        pub amt_to_forward_msat: i64,
        #[prost(int64, tag = "7")]
        pub fee_msat: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Route {
        #[prost(uint32, tag = "1")]
        pub total_time_lock: u32,
        #[prost(message, repeated, tag = "4")]
        pub hops: Vec<Hop>,
        #[prost(int64, tag = "5")]
        pub total_fees_msat: i64,
        #[prost(int64, tag = "6")]
        pub total_amt_msat: i64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct QueryRoutesResponse {
        #[prost(message, repeated, tag = "1")]
        pub routes: Vec<Route>,
        #[prost(double, tag = "2")]
        pub success_prob: f64,
    }
}
