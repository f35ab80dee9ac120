use lspc_core::CoreError;
use lspc_crypto::CryptoError;

/// Route construction and payment errors.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("no route: {0}")]
    NoRoute(String),

    #[error("fee {fee_sat} sat is not under the limit of {fee_limit_sat} sat")]
    FeeLimitExceeded { fee_sat: i64, fee_limit_sat: i64 },

    #[error("no local channel has {amount_sat} sat of local balance")]
    NoLocalChannel { amount_sat: i64 },

    #[error("invoice expired at unix time {expired_at}")]
    InvoiceExpired { expired_at: i64 },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
