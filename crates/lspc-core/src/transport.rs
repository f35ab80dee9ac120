use async_trait::async_trait;

use crate::error::CoreError;
use crate::proto::lspd::{
    ChannelInformationReply, ChannelInformationRequest, Encrypted, IntegrityVerifyReply,
    OpenChannelReply, OpenChannelRequest, PingReply, PingRequest, ReceiveSubmarineReply,
    RegisterPaymentReply, RegisterPaymentRequest, RegisterUserInfoReply, ReportReply,
};

/// Unary calls of the LSP service.
///
/// Implementations only move envelopes; sealing and opening of the
/// `Encrypted` payloads happens above this layer.
#[async_trait]
pub trait LspTransport: Send + Sync {
    async fn channel_information(
        &self,
        req: ChannelInformationRequest,
    ) -> Result<ChannelInformationReply, CoreError>;

    async fn ping(&self, req: PingRequest) -> Result<PingReply, CoreError>;

    async fn register_payment(
        &self,
        req: RegisterPaymentRequest,
    ) -> Result<RegisterPaymentReply, CoreError>;

    /// Reply is sealed to the key carried in the request.
    async fn register_submarine(&self, req: Encrypted) -> Result<Encrypted, CoreError>;

    async fn receive_submarine(&self, req: Encrypted) -> Result<ReceiveSubmarineReply, CoreError>;

    /// Reply is a sealed `lnrpc.QueryRoutesResponse`.
    async fn query_routes(&self, req: Encrypted) -> Result<Encrypted, CoreError>;

    async fn register_user_info(&self, req: Encrypted) -> Result<RegisterUserInfoReply, CoreError>;

    async fn report_message(&self, req: Encrypted) -> Result<ReportReply, CoreError>;

    async fn open_channel(&self, req: OpenChannelRequest) -> Result<OpenChannelReply, CoreError>;

    async fn integrity_nonce(&self, req: Encrypted) -> Result<Encrypted, CoreError>;

    async fn integrity_verify(&self, req: Encrypted) -> Result<IntegrityVerifyReply, CoreError>;
}
