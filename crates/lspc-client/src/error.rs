use lspc_core::CoreError;
use lspc_crypto::CryptoError;
use lspc_routing::RoutingError;
use lspc_swap::SwapError;

/// Coarse classification of a [`ClientError`] for callers deciding what to
/// do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Dial or RPC failure.
    Transport,
    /// Key, encryption or signature failure.
    Crypto,
    /// Malformed or unexpected reply.
    Protocol,
    /// Channel information is not cached; reconnect and retry.
    NotInitialized,
    Routing,
    /// Swap address does not match our derivation. Never fund it.
    ScriptMismatch,
    Configuration,
    /// The local Lightning node refused or failed a call.
    Node,
    InvalidInput,
    /// A background task died.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error("a channel can already receive {available} sat (requested {requested} sat)")]
    AlreadyReceivable { available: i64, requested: i64 },

    #[error("payment address differs between invoices")]
    PaymentAddrMismatch,

    #[error("task failed: {0}")]
    Task(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => core_kind(e),
            Self::Crypto(e) => crypto_kind(e),
            Self::Routing(e) => match e {
                RoutingError::Core(e) => core_kind(e),
                RoutingError::Crypto(e) => crypto_kind(e),
                RoutingError::InvoiceExpired { .. } => ErrorKind::InvalidInput,
                _ => ErrorKind::Routing,
            },
            Self::Swap(e) => match e {
                SwapError::ScriptMismatch { .. } => ErrorKind::ScriptMismatch,
                SwapError::InvalidCsvHeight(_) | SwapError::UnsupportedNetwork(_) => {
                    ErrorKind::Configuration
                }
                SwapError::Signing(_) => ErrorKind::Crypto,
                SwapError::Core(e) => core_kind(e),
                SwapError::Crypto(e) => crypto_kind(e),
                SwapError::PushTooLarge(_)
                | SwapError::InvalidAddress(_)
                | SwapError::InvalidInput(_)
                | SwapError::InsufficientFunds { .. } => ErrorKind::InvalidInput,
            },
            Self::AlreadyReceivable { .. } => ErrorKind::InvalidInput,
            Self::PaymentAddrMismatch => ErrorKind::Node,
            Self::Task(_) => ErrorKind::Internal,
        }
    }

    /// True when re-running the handshake and retrying may succeed.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::NotInitialized
    }
}

fn core_kind(e: &CoreError) -> ErrorKind {
    match e {
        CoreError::Transport(_) => ErrorKind::Transport,
        CoreError::Node(_) => ErrorKind::Node,
        CoreError::NotInitialized => ErrorKind::NotInitialized,
        CoreError::Protocol(_) | CoreError::Decode(_) => ErrorKind::Protocol,
        CoreError::Configuration(_) => ErrorKind::Configuration,
        CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
    }
}

fn crypto_kind(e: &CryptoError) -> ErrorKind {
    match e {
        CryptoError::MalformedPayload(_) => ErrorKind::Protocol,
        _ => ErrorKind::Crypto,
    }
}
