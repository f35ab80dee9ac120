use async_trait::async_trait;

use crate::error::CoreError;

/// Blockchain-history watcher that reports channels closed on chain.
///
/// Runs as its own subsystem; the client only talks to it through this trait.
#[async_trait]
pub trait CloseWatcher: Send + Sync {
    /// Start watching a `txid:index` channel point.
    async fn register(&self, channel_point: &str) -> Result<(), CoreError>;

    async fn unregister(&self, channel_point: &str) -> Result<(), CoreError>;

    /// Number of watched channel points spent by a transaction with at least
    /// two confirmations whose input matches the outpoint.
    async fn check_closed(&self) -> Result<usize, CoreError>;
}
