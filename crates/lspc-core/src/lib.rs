//! Core of the LSP client: channel terms, Lightning route types, the wire
//! messages spoken with the LSP, and the capability traits through which the
//! engine reaches the local Lightning node and the LSP transport.

pub mod config;
pub mod error;
pub mod fees;
pub mod node;
pub mod proto;
pub mod transport;
pub mod types;
pub mod watch;

pub use config::{ClientConfig, LndConfig, LoggingConfig, LspConfig, RebalanceConfig, SwapConfig};
pub use error::CoreError;
pub use fees::{fee_hint, hop_fee_msat, receivable_max, service_fee_sat, FeeHint};
pub use node::{
    AddedInvoice, Channel, HopHint, HtlcAttempt, HtlcFailure, InvoiceMode, InvoiceRequest, LnNode,
    NodeInfo, PayReq, Payment, SendResponse,
};
pub use transport::LspTransport;
pub use types::{
    ChannelInformation, Hop, MppRecord, NodePair, PaymentFailureReason, PaymentStatus, Route,
    MSAT_PER_SAT,
};
pub use watch::CloseWatcher;
