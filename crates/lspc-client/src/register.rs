use rand::RngCore;

use lspc_core::proto::lspd::{PaymentInformation, RegisterPaymentRequest};
use lspc_core::{
    receivable_max, service_fee_sat, ChannelInformation, CoreError, HopHint, InvoiceMode,
    InvoiceRequest, LnNode, LspTransport, MSAT_PER_SAT,
};
use lspc_crypto::SecureChannel;

use crate::error::ClientError;

/// Placeholder short channel id of the route hint; the channel does not
/// exist until the LSP opens it.
pub const HINT_CHAN_ID: u64 = 333_333;

/// Registers an on-the-fly channel payment with the LSP.
///
/// Two invoices share one preimage and payment address: one registered on
/// the node for the amount the LSP will forward after its fee, and one
/// create-only invoice for the full amount, handed to the payer.
pub struct PaymentRegistrar<'a> {
    transport: &'a dyn LspTransport,
    node: &'a dyn LnNode,
    info: &'a ChannelInformation,
}

impl<'a> PaymentRegistrar<'a> {
    pub fn new(
        transport: &'a dyn LspTransport,
        node: &'a dyn LnNode,
        info: &'a ChannelInformation,
    ) -> Self {
        Self {
            transport,
            node,
            info,
        }
    }

    /// Returns the invoice for the payer.
    pub async fn register(
        &self,
        node_id: &[u8],
        amount_sat: i64,
        memo: &str,
    ) -> Result<String, ClientError> {
        let available = receivable_max(&self.node.list_channels().await?);
        if available >= amount_sat {
            return Err(ClientError::AlreadyReceivable {
                available,
                requested: amount_sat,
            });
        }

        let mut preimage = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut preimage);

        let fee_sat = service_fee_sat(self.info, amount_sat);
        let incoming_sat = amount_sat;
        let outgoing_sat = amount_sat - fee_sat;
        let incoming_msat = to_msat(incoming_sat)?;
        let outgoing_msat = to_msat(outgoing_sat)?;
        let hint = route_hint(self.info)?;

        let registered = self
            .node
            .add_invoice(InvoiceRequest {
                amount_sat: outgoing_sat,
                preimage: preimage.clone(),
                memo: memo.to_string(),
                route_hint: Some(hint.clone()),
                payment_addr: None,
                mode: InvoiceMode::Register,
            })
            .await?;
        tracing::trace!(invoice = %registered.payment_request, "invoice for LSP");

        let for_payer = self
            .node
            .add_invoice(InvoiceRequest {
                amount_sat: incoming_sat,
                preimage,
                memo: memo.to_string(),
                route_hint: Some(hint),
                payment_addr: Some(registered.payment_addr.clone()),
                mode: InvoiceMode::CreateOnly,
            })
            .await?;
        if for_payer.payment_addr != registered.payment_addr {
            tracing::error!(
                registered = %hex::encode(&registered.payment_addr),
                created = %hex::encode(&for_payer.payment_addr),
                "payment address not shared"
            );
            return Err(ClientError::PaymentAddrMismatch);
        }

        let payment = PaymentInformation {
            payment_hash: for_payer.r_hash.clone(),
            payment_secret: registered.payment_addr,
            destination: node_id.to_vec(),
            incoming_amount_msat: incoming_msat,
            outgoing_amount_msat: outgoing_msat,
        };
        let blob = SecureChannel::new(&self.info.lsp_pubkey)?.seal_bytes(&payment)?;
        self.transport
            .register_payment(RegisterPaymentRequest {
                lsp_id: String::new(),
                blob,
            })
            .await?;

        tracing::info!(
            amount_sat,
            fee_sat,
            payment_hash = %hex::encode(&for_payer.r_hash),
            "payment registered"
        );
        Ok(for_payer.payment_request)
    }
}

fn to_msat(amount_sat: i64) -> Result<i64, CoreError> {
    amount_sat
        .checked_mul(MSAT_PER_SAT)
        .ok_or_else(|| CoreError::InvalidInput(format!("amount {amount_sat} sat overflows msat")))
}

/// Hint through the LSP's not yet opened channel, priced with its terms.
fn route_hint(info: &ChannelInformation) -> Result<HopHint, CoreError> {
    let fee_base_msat = u32::try_from(info.base_fee_msat)
        .map_err(|_| CoreError::Protocol(format!("base fee {} msat out of range", info.base_fee_msat)))?;
    let millionths = (info.fee_rate * 1_000_000.0) as i64;
    let fee_proportional_millionths = u32::try_from(millionths)
        .map_err(|_| CoreError::Protocol(format!("fee rate {} out of range", info.fee_rate)))?;
    Ok(HopHint {
        node_id: info.node_pubkey.clone(),
        chan_id: HINT_CHAN_ID,
        fee_base_msat,
        fee_proportional_millionths,
        cltv_expiry_delta: info.time_lock_delta,
    })
}
