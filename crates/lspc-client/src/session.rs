//! Session state shared by every operation of one client.
//!
//! Holds the local node id and the LSP's channel terms. Terms are populated
//! by a handshake, read through cheap `Arc` snapshots, and dropped when the
//! LSP stops answering pings so the next caller handshakes again.

use std::sync::Arc;

use parking_lot::RwLock;

use lspc_core::proto::lspd::ChannelInformationRequest;
use lspc_core::{ChannelInformation, CoreError, LnNode, LspTransport};

#[derive(Debug, Default)]
pub struct LspSession {
    node_id: RwLock<Option<Vec<u8>>>,
    info: RwLock<Option<Arc<ChannelInformation>>>,
}

impl LspSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local node id, asked from the node once per session.
    pub async fn node_id(&self, node: &dyn LnNode) -> Result<Vec<u8>, CoreError> {
        let cached = self.node_id.read().clone();
        if let Some(id) = cached {
            return Ok(id);
        }
        let info = node.get_info().await?;
        let id = hex::decode(&info.identity_pubkey)
            .map_err(|e| CoreError::Node(format!("identity pubkey is not hex: {e}")))?;
        *self.node_id.write() = Some(id.clone());
        tracing::debug!(node_id = %info.identity_pubkey, "local node id resolved");
        Ok(id)
    }

    /// Fetch channel terms from the LSP and replace the cached ones.
    pub async fn refresh(
        &self,
        transport: &dyn LspTransport,
        node: &dyn LnNode,
    ) -> Result<Arc<ChannelInformation>, CoreError> {
        let node_id = self.node_id(node).await?;
        let reply = transport
            .channel_information(ChannelInformationRequest {
                pubkey: hex::encode(&node_id),
            })
            .await?;
        let info = Arc::new(ChannelInformation::try_from(reply)?);
        *self.info.write() = Some(Arc::clone(&info));
        tracing::info!(
            lsp = %info.name,
            node = %info.node_pubkey,
            version = %info.version,
            "channel information cached"
        );
        Ok(info)
    }

    /// Cached terms, or a handshake when there are none.
    pub async fn ensure(
        &self,
        transport: &dyn LspTransport,
        node: &dyn LnNode,
    ) -> Result<Arc<ChannelInformation>, CoreError> {
        match self.snapshot() {
            Ok(info) => Ok(info),
            Err(_) => self.refresh(transport, node).await,
        }
    }

    pub fn snapshot(&self) -> Result<Arc<ChannelInformation>, CoreError> {
        self.info.read().clone().ok_or(CoreError::NotInitialized)
    }

    pub fn invalidate(&self) {
        if self.info.write().take().is_some() {
            tracing::info!("channel information cleared");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.info.read().is_some()
    }
}
