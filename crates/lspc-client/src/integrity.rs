//! Device integrity attestation relayed through the LSP.

use lspc_core::proto::lspd::{
    IntegrityNonceReply, IntegrityNonceRequest, IntegrityResult, IntegrityVerifyRequest,
};
use lspc_core::{ChannelInformation, LspTransport};
use lspc_crypto::{ReplyKey, SecureChannel};

use crate::error::ClientError;

/// Ask the LSP for a nonce to bind the attestation of device `id` to.
pub async fn integrity_nonce(
    transport: &dyn LspTransport,
    info: &ChannelInformation,
    node_id: &[u8],
    id: &str,
) -> Result<String, ClientError> {
    let channel = SecureChannel::new(&info.lsp_pubkey)?;
    let reply_key = ReplyKey::generate();
    let req = IntegrityNonceRequest {
        encrypt_pubkey: reply_key.public_bytes(),
        pubkey: node_id.to_vec(),
        id: id.to_string(),
    };
    let reply = transport.integrity_nonce(channel.seal(&req)?).await?;
    let rsp: IntegrityNonceReply = reply_key.open(&reply)?;
    tracing::debug!(id, "integrity nonce received");
    Ok(rsp.nonce)
}

/// Submit an attestation `token` for verification.
pub async fn integrity_verify(
    transport: &dyn LspTransport,
    info: &ChannelInformation,
    node_id: &[u8],
    id: &str,
    token: &str,
) -> Result<IntegrityResult, ClientError> {
    let channel = SecureChannel::new(&info.lsp_pubkey)?;
    let req = IntegrityVerifyRequest {
        pubkey: node_id.to_vec(),
        token: token.to_string(),
        id: id.to_string(),
    };
    let reply = transport.integrity_verify(channel.seal(&req)?).await?;
    let result = reply.result();
    tracing::debug!(id, ?result, "integrity verified");
    Ok(result)
}
