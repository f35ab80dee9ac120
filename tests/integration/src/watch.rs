use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use lspc_core::{CloseWatcher, CoreError};

/// Close watcher whose "chain" is a set of channel points marked spent.
#[derive(Default)]
pub struct MemoryCloseWatcher {
    watched: Mutex<BTreeSet<String>>,
    spent: Mutex<BTreeSet<String>>,
}

impl MemoryCloseWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a closing transaction for `channel_point` confirmed.
    pub fn mark_spent(&self, channel_point: &str) {
        self.spent.lock().insert(channel_point.to_string());
    }

    pub fn watched(&self) -> Vec<String> {
        self.watched.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl CloseWatcher for MemoryCloseWatcher {
    async fn register(&self, channel_point: &str) -> Result<(), CoreError> {
        self.watched.lock().insert(channel_point.to_string());
        Ok(())
    }

    async fn unregister(&self, channel_point: &str) -> Result<(), CoreError> {
        self.watched.lock().remove(channel_point);
        Ok(())
    }

    async fn check_closed(&self) -> Result<usize, CoreError> {
        let spent = self.spent.lock();
        Ok(self.watched.lock().iter().filter(|p| spent.contains(*p)).count())
    }
}
