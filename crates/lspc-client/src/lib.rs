//! Caller-facing LSP client.
//!
//! [`LspClient`] owns the session and the two collaborators (LSP transport and
//! local node) and exposes every operation: channel terms and fees, payment
//! registration, route-and-pay, submarine swaps, self-rebalance, account and
//! integrity calls. [`GrpcLspTransport`] and [`LndRestNode`] are the
//! production collaborators.

pub mod client;
pub mod error;
pub mod integrity;
pub mod lnd;
pub mod rebalance;
pub mod register;
pub mod session;
pub mod transport;

pub use client::LspClient;
pub use error::{ClientError, ErrorKind};
pub use lnd::LndRestNode;
pub use rebalance::{RebalanceReport, SelfRebalancer, CLOSE_ATTEMPTS, REBALANCE_TIME_LOCK_DELAY};
pub use register::{PaymentRegistrar, HINT_CHAN_ID};
pub use session::LspSession;
pub use transport::GrpcLspTransport;
