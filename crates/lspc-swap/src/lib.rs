//! Submarine swaps with the LSP.
//!
//! Funds are locked on chain in a P2WSH output the LSP can claim with the
//! payment preimage, or we can take back after a relative timelock. This
//! crate builds that script, registers swaps with the LSP while checking the
//! LSP's address against our own derivation, and assembles the refund
//! transaction.

pub mod engine;
pub mod error;
pub mod refund;
pub mod script;
pub mod types;

pub use engine::{network_from_name, SubmarineSwapEngine, SCRIPT_VERSION};
pub use error::SwapError;
pub use refund::build_refund_tx;
pub use script::{submarine_script, ScriptBuilder};
pub use types::{RepayData, SubmarineSwap, SwapKeys};
