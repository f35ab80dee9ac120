use lspc_core::proto::lspd::{ReportLevel, ReportRequest};
use lspc_core::{ChannelInformation, LspTransport};
use lspc_crypto::SecureChannel;

use crate::error::RoutingError;

/// Send a diagnostic message to the LSP, sealed to its key.
pub async fn report_message(
    transport: &dyn LspTransport,
    info: &ChannelInformation,
    category: &str,
    level: ReportLevel,
    message: &str,
) -> Result<(), RoutingError> {
    let channel = SecureChannel::new(&info.lsp_pubkey)?;
    let mut req = ReportRequest {
        category: category.to_string(),
        level: 0,
        message: message.to_string(),
    };
    req.set_level(level);
    transport.report_message(channel.seal(&req)?).await?;
    tracing::debug!(category, ?level, "report sent");
    Ok(())
}
