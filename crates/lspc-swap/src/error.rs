use lspc_core::CoreError;
use lspc_crypto::CryptoError;

/// Submarine swap errors.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("CSV height {0} outside 2..=32767")]
    InvalidCsvHeight(u32),

    #[error("cannot push {0} bytes directly")]
    PushTooLarge(usize),

    #[error("script address mismatch: expected {expected}, got {actual}")]
    ScriptMismatch { expected: String, actual: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("refund inputs of {total_sat} sat leave only dust after a fee of {fee_sat} sat")]
    InsufficientFunds { total_sat: u64, fee_sat: u64 },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
