//! gRPC transport to the LSP.
//!
//! One lazily connected [`Channel`] per client. Every call is a unary request
//! on `lspdrpc.LightningService` carrying the bearer token.

use async_trait::async_trait;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

use lspc_core::proto::lspd::{
    ChannelInformationReply, ChannelInformationRequest, Encrypted, IntegrityVerifyReply,
    OpenChannelReply, OpenChannelRequest, PingReply, PingRequest, ReceiveSubmarineReply,
    RegisterPaymentReply, RegisterPaymentRequest, RegisterUserInfoReply, ReportReply,
};
use lspc_core::{CoreError, LspConfig, LspTransport};

/// Server name the LSP's self-signed certificate is issued for.
const TLS_DOMAIN: &str = "localhost";

const CHANNEL_INFORMATION: &str = "/lspdrpc.LightningService/ChannelInformation";
const PING: &str = "/lspdrpc.LightningService/Ping";
const REGISTER_PAYMENT: &str = "/lspdrpc.LightningService/RegisterPayment";
const REGISTER_SUBMARINE: &str = "/lspdrpc.LightningService/RegisterSubmarine";
const RECEIVE_SUBMARINE: &str = "/lspdrpc.LightningService/ReceiveSubmarine";
const QUERY_ROUTES: &str = "/lspdrpc.LightningService/QueryRoutes";
const REGISTER_USER_INFO: &str = "/lspdrpc.LightningService/RegisterUserInfo";
const REPORT_MESSAGE: &str = "/lspdrpc.LightningService/ReportMessage";
const OPEN_CHANNEL: &str = "/lspdrpc.LightningService/OpenChannel";
const INTEGRITY_NONCE: &str = "/lspdrpc.LightningService/IntegrityNonce";
const INTEGRITY_VERIFY: &str = "/lspdrpc.LightningService/IntegrityVerify";

#[derive(Debug, Clone)]
pub struct GrpcLspTransport {
    channel: Channel,
    token: Option<MetadataValue<Ascii>>,
}

impl GrpcLspTransport {
    /// Build the transport without dialing; the first call connects.
    ///
    /// With `cert_path` set the LSP certificate is trusted as CA for server
    /// name `localhost`. `https` without a certificate uses the system roots,
    /// `http` goes unencrypted.
    pub fn new(config: &LspConfig) -> Result<Self, CoreError> {
        let mut endpoint = Endpoint::from_shared(config.address.clone())
            .map_err(|e| CoreError::Configuration(format!("LSP address {}: {e}", config.address)))?
            .connect_timeout(config.connect_timeout())
            .timeout(config.call_timeout());

        if let Some(path) = &config.cert_path {
            let pem = std::fs::read(path)
                .map_err(|e| CoreError::Configuration(format!("read {}: {e}", path.display())))?;
            let tls = ClientTlsConfig::new()
                .ca_certificate(Certificate::from_pem(pem))
                .domain_name(TLS_DOMAIN);
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|e| CoreError::Configuration(format!("LSP TLS: {e}")))?;
        } else if config.address.starts_with("https://") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| CoreError::Configuration(format!("LSP TLS: {e}")))?;
        } else {
            tracing::warn!(address = %config.address, "LSP connection without TLS");
        }

        Ok(Self {
            channel: endpoint.connect_lazy(),
            token: bearer_metadata(&config.token)?,
        })
    }

    async fn unary<Req, Resp>(&self, method: &'static str, message: Req) -> Result<Resp, CoreError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| CoreError::Transport(format!("{method}: not ready: {e}")))?;

        let mut request = tonic::Request::new(message);
        if let Some(token) = &self.token {
            request.metadata_mut().insert("authorization", token.clone());
        }
        tracing::trace!(method, "LSP call");

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(method), codec)
            .await
            .map_err(|status| {
                CoreError::Transport(format!(
                    "{method}: {} ({})",
                    status.message(),
                    status.code()
                ))
            })?;
        Ok(response.into_inner())
    }
}

fn bearer_metadata(token: &str) -> Result<Option<MetadataValue<Ascii>>, CoreError> {
    if token.is_empty() {
        return Ok(None);
    }
    format!("Bearer {token}")
        .parse()
        .map(Some)
        .map_err(|_| CoreError::Configuration("LSP token is not valid ASCII".into()))
}

#[async_trait]
impl LspTransport for GrpcLspTransport {
    async fn channel_information(
        &self,
        req: ChannelInformationRequest,
    ) -> Result<ChannelInformationReply, CoreError> {
        self.unary(CHANNEL_INFORMATION, req).await
    }

    async fn ping(&self, req: PingRequest) -> Result<PingReply, CoreError> {
        self.unary(PING, req).await
    }

    async fn register_payment(
        &self,
        req: RegisterPaymentRequest,
    ) -> Result<RegisterPaymentReply, CoreError> {
        self.unary(REGISTER_PAYMENT, req).await
    }

    async fn register_submarine(&self, req: Encrypted) -> Result<Encrypted, CoreError> {
        self.unary(REGISTER_SUBMARINE, req).await
    }

    async fn receive_submarine(&self, req: Encrypted) -> Result<ReceiveSubmarineReply, CoreError> {
        self.unary(RECEIVE_SUBMARINE, req).await
    }

    async fn query_routes(&self, req: Encrypted) -> Result<Encrypted, CoreError> {
        self.unary(QUERY_ROUTES, req).await
    }

    async fn register_user_info(&self, req: Encrypted) -> Result<RegisterUserInfoReply, CoreError> {
        self.unary(REGISTER_USER_INFO, req).await
    }

    async fn report_message(&self, req: Encrypted) -> Result<ReportReply, CoreError> {
        self.unary(REPORT_MESSAGE, req).await
    }

    async fn open_channel(&self, req: OpenChannelRequest) -> Result<OpenChannelReply, CoreError> {
        self.unary(OPEN_CHANNEL, req).await
    }

    async fn integrity_nonce(&self, req: Encrypted) -> Result<Encrypted, CoreError> {
        self.unary(INTEGRITY_NONCE, req).await
    }

    async fn integrity_verify(&self, req: Encrypted) -> Result<IntegrityVerifyReply, CoreError> {
        self.unary(INTEGRITY_VERIFY, req).await
    }
}
