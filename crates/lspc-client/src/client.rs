use std::sync::Arc;

use lspc_core::proto::lspd::{
    IntegrityResult, OpenChannelRequest, PingRequest, RegisterUserInfoRequest, ReportLevel,
};
use lspc_core::{
    fee_hint, receivable_max, service_fee_sat, Channel, ChannelInformation, ClientConfig,
    CloseWatcher, CoreError, FeeHint, LnNode, LspTransport,
};
use lspc_crypto::SecureChannel;
use lspc_routing::{report_message, PaymentDispatcher, PaymentOutcome};
use lspc_swap::{RepayData, SubmarineSwap, SubmarineSwapEngine, SwapKeys};

use crate::error::ClientError;
use crate::integrity;
use crate::lnd::LndRestNode;
use crate::rebalance::{RebalanceReport, SelfRebalancer};
use crate::register::PaymentRegistrar;
use crate::session::LspSession;
use crate::transport::GrpcLspTransport;

/// Entry point for every LSP operation of one wallet.
///
/// Operations that talk to the LSP first make sure channel terms are cached,
/// handshaking if needed. The local accessors (`version`, `fee_permyriad`,
/// ...) only read the cache and fail with `NotInitialized` when it is empty.
pub struct LspClient {
    config: ClientConfig,
    transport: Arc<dyn LspTransport>,
    node: Arc<dyn LnNode>,
    session: LspSession,
    watcher: Option<Arc<dyn CloseWatcher>>,
}

impl LspClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn LspTransport>, node: Arc<dyn LnNode>) -> Self {
        Self {
            config,
            transport,
            node,
            session: LspSession::new(),
            watcher: None,
        }
    }

    /// Attach the on-chain watcher used by the channel-close operations.
    pub fn with_close_watcher(mut self, watcher: Arc<dyn CloseWatcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Client over the gRPC LSP transport and LND's REST API.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = GrpcLspTransport::new(&config.lsp)?;
        let node = LndRestNode::new(&config.lnd)?;
        Ok(Self::new(config, Arc::new(transport), Arc::new(node)))
    }

    pub fn session(&self) -> &LspSession {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn ensure(&self) -> Result<Arc<ChannelInformation>, ClientError> {
        Ok(self
            .session
            .ensure(self.transport.as_ref(), self.node.as_ref())
            .await?)
    }

    async fn node_id(&self) -> Result<Vec<u8>, ClientError> {
        Ok(self.session.node_id(self.node.as_ref()).await?)
    }

    fn watcher(&self) -> Result<&dyn CloseWatcher, ClientError> {
        self.watcher
            .as_deref()
            .ok_or_else(|| CoreError::Configuration("no close watcher attached".into()).into())
    }

    fn swap_engine(&self) -> SubmarineSwapEngine<'_> {
        SubmarineSwapEngine::new(
            self.transport.as_ref(),
            self.node.as_ref(),
            self.config.swap.csv_height,
            self.config.swap.fee_rate_sat_per_kw,
        )
    }

    // ---------------------------------------------------------------------
    // Cached terms
    // ---------------------------------------------------------------------

    /// Protocol version the LSP announced.
    pub fn version(&self) -> Result<String, ClientError> {
        Ok(self.session.snapshot()?.version.clone())
    }

    /// `pubkey@host` of the LSP node.
    pub fn hub_node_string(&self) -> Result<String, ClientError> {
        Ok(self.session.snapshot()?.hub_node_string())
    }

    pub fn fee_permyriad(&self) -> Result<i64, ClientError> {
        Ok(self.session.snapshot()?.fee_permyriad)
    }

    /// LSP service fee in sat for receiving `amount_sat` over a new channel.
    pub fn payment_fee(&self, amount_sat: i64) -> Result<i64, ClientError> {
        Ok(service_fee_sat(&*self.session.snapshot()?, amount_sat))
    }

    /// Route hint policy for invoices whose hint goes through `peer_node`.
    pub fn fee_hint(&self, peer_node: &[u8]) -> Option<FeeHint> {
        let info = self.session.snapshot().ok()?;
        fee_hint(&info, peer_node)
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Liveness check. A failed ping clears the cached terms.
    pub async fn ping(&self, nonce: i32) -> Result<i32, ClientError> {
        self.ensure().await?;
        match self.transport.ping(PingRequest { nonce }).await {
            Ok(reply) => Ok(reply.nonce),
            Err(e) => {
                tracing::info!(error = %e, "ping failed");
                self.session.invalidate();
                Err(e.into())
            }
        }
    }

    /// Largest amount (sat) an existing channel can receive.
    pub async fn receive_max(&self) -> Result<i64, ClientError> {
        Ok(receivable_max(&self.node.list_channels().await?))
    }

    // ---------------------------------------------------------------------
    // Payments
    // ---------------------------------------------------------------------

    /// Register an on-the-fly channel payment; returns the payer's invoice.
    pub async fn register_payment(&self, amount_sat: i64, memo: &str) -> Result<String, ClientError> {
        let info = self.ensure().await?;
        let node_id = self.node_id().await?;
        PaymentRegistrar::new(self.transport.as_ref(), self.node.as_ref(), &info)
            .register(&node_id, amount_sat, memo)
            .await
    }

    /// Pay `invoice` over LSP-supplied routes.
    pub async fn query_route_payment(
        &self,
        invoice: &str,
        fee_limit_sat: i64,
        amount_sat: i64,
    ) -> Result<PaymentOutcome, ClientError> {
        let info = self.ensure().await?;
        let outcome = PaymentDispatcher::new(self.transport.as_ref(), self.node.as_ref(), &info)
            .pay(invoice, fee_limit_sat, amount_sat)
            .await?;
        Ok(outcome)
    }

    pub async fn self_rebalance(&self) -> Result<RebalanceReport, ClientError> {
        let info = self.ensure().await?;
        SelfRebalancer::new(Arc::clone(&self.node), info, self.config.rebalance.clone())
            .run()
            .await
    }

    // ---------------------------------------------------------------------
    // Submarine swaps
    // ---------------------------------------------------------------------

    /// Blocks until a swap output can be refunded.
    pub fn submarine_refund_block(&self) -> u32 {
        self.config.swap.csv_height
    }

    pub fn submarine_create_keys(&self) -> SwapKeys {
        SwapKeys::generate()
    }

    pub async fn submarine_register(
        &self,
        payment_hash: &[u8],
        refund_pubkey: &[u8],
    ) -> Result<SubmarineSwap, ClientError> {
        let info = self.ensure().await?;
        let node_id = self.node_id().await?;
        Ok(self
            .swap_engine()
            .register(&info, &node_id, payment_hash, refund_pubkey)
            .await?)
    }

    pub async fn submarine_receive(&self, payment_hash: &[u8], invoice: &str) -> Result<(), ClientError> {
        let info = self.ensure().await?;
        Ok(self.swap_engine().receive(&info, payment_hash, invoice).await?)
    }

    /// Refund matured swap outputs to `address`; returns the txid.
    pub async fn submarine_repayment(
        &self,
        inputs: &[RepayData],
        address: &str,
        label: &str,
    ) -> Result<String, ClientError> {
        self.ensure().await?;
        let txid = self.swap_engine().repay(inputs, address, label).await?;
        Ok(txid.to_string())
    }

    pub async fn submarine_reregister(&self, script: &[u8]) -> Result<String, ClientError> {
        self.ensure().await?;
        Ok(self.swap_engine().reregister(script).await?)
    }

    // ---------------------------------------------------------------------
    // Account
    // ---------------------------------------------------------------------

    pub async fn register_user_info(&self, mail_address: &str) -> Result<(), ClientError> {
        let info = self.ensure().await?;
        let req = RegisterUserInfoRequest {
            mail_address: mail_address.to_string(),
        };
        let sealed = SecureChannel::new(&info.lsp_pubkey)?.seal(&req)?;
        self.transport.register_user_info(sealed).await?;
        tracing::debug!("user info registered");
        Ok(())
    }

    pub async fn report_message(
        &self,
        category: &str,
        level: ReportLevel,
        message: &str,
    ) -> Result<(), ClientError> {
        let info = self.ensure().await?;
        Ok(report_message(self.transport.as_ref(), &info, category, level, message).await?)
    }

    /// Ask the LSP to open a channel to this node.
    pub async fn request_open_channel(&self) -> Result<(), ClientError> {
        self.ensure().await?;
        let node_id = self.node_id().await?;
        self.transport
            .open_channel(OpenChannelRequest {
                pubkey: hex::encode(&node_id),
            })
            .await?;
        tracing::info!("channel open requested");
        Ok(())
    }

    pub async fn integrity_nonce(&self, id: &str) -> Result<String, ClientError> {
        let info = self.ensure().await?;
        let node_id = self.node_id().await?;
        integrity::integrity_nonce(self.transport.as_ref(), &info, &node_id, id).await
    }

    pub async fn integrity_verify(&self, id: &str, token: &str) -> Result<IntegrityResult, ClientError> {
        let info = self.ensure().await?;
        let node_id = self.node_id().await?;
        integrity::integrity_verify(self.transport.as_ref(), &info, &node_id, id, token).await
    }

    // ---------------------------------------------------------------------
    // Channel close watch
    // ---------------------------------------------------------------------

    /// Start watching `channel_point` (`txid:index`) for an on-chain close.
    pub async fn watch_channel_close(&self, channel_point: &str) -> Result<(), ClientError> {
        let watcher = self.watcher()?;
        validate_channel_point(channel_point)?;
        watcher.register(channel_point).await?;
        tracing::debug!(channel_point, "watching channel close");
        Ok(())
    }

    pub async fn unwatch_channel_close(&self, channel_point: &str) -> Result<(), ClientError> {
        Ok(self.watcher()?.unregister(channel_point).await?)
    }

    /// Number of watched channels closed on chain.
    pub async fn check_closed_channels(&self) -> Result<usize, ClientError> {
        let closed = self.watcher()?.check_closed().await?;
        if closed > 0 {
            tracing::info!(closed, "watched channels closed on chain");
        }
        Ok(closed)
    }
}

fn validate_channel_point(channel_point: &str) -> Result<(), CoreError> {
    let ch = Channel {
        channel_point: channel_point.to_string(),
        ..Channel::default()
    };
    let (txid, _) = ch.funding_outpoint()?;
    if txid.len() != 64 || hex::decode(&txid).is_err() {
        return Err(CoreError::InvalidInput(format!(
            "bad channel point txid: {channel_point}"
        )));
    }
    Ok(())
}
