use std::str::FromStr;

use bitcoin::consensus::encode::serialize;
use bitcoin::{Address, Network, Txid};
use lspc_core::proto::lspd::{
    ReceiveSubmarineRequest, RegisterSubmarineReply, RegisterSubmarineRequest,
};
use lspc_core::{ChannelInformation, LnNode, LspTransport};
use lspc_crypto::{parse_public_key, ReplyKey, SecureChannel};

use crate::error::SwapError;
use crate::refund::build_refund_tx;
use crate::script::submarine_script;
use crate::types::{RepayData, SubmarineSwap};

/// Swap script version announced to the LSP.
pub const SCRIPT_VERSION: i32 = 2;

/// Map the node's chain name onto a bitcoin network.
pub fn network_from_name(name: &str) -> Result<Network, SwapError> {
    match name {
        "mainnet" | "bitcoin" => Ok(Network::Bitcoin),
        "testnet" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        other => Err(SwapError::UnsupportedNetwork(other.to_string())),
    }
}

/// Registers swaps with the LSP and sweeps matured swap outputs back.
pub struct SubmarineSwapEngine<'a> {
    transport: &'a dyn LspTransport,
    node: &'a dyn LnNode,
    csv_height: u32,
    fee_rate_sat_per_kw: u64,
}

impl<'a> SubmarineSwapEngine<'a> {
    pub fn new(
        transport: &'a dyn LspTransport,
        node: &'a dyn LnNode,
        csv_height: u32,
        fee_rate_sat_per_kw: u64,
    ) -> Self {
        Self {
            transport,
            node,
            csv_height,
            fee_rate_sat_per_kw,
        }
    }

    pub fn csv_height(&self) -> u32 {
        self.csv_height
    }

    /// Register a swap for `payment_hash`, refundable to `refund_pubkey`.
    ///
    /// The address the LSP answers with must equal both the P2WSH address we
    /// derive from the rebuilt script and the address the node reports when
    /// it starts watching that script.
    pub async fn register(
        &self,
        info: &ChannelInformation,
        node_pubkey: &[u8],
        payment_hash: &[u8],
        refund_pubkey: &[u8],
    ) -> Result<SubmarineSwap, SwapError> {
        let hash: [u8; 32] = payment_hash.try_into().map_err(|_| {
            SwapError::InvalidInput(format!(
                "payment hash must be 32 bytes, got {}",
                payment_hash.len()
            ))
        })?;
        let refund_key = parse_public_key(refund_pubkey)?;

        let channel = SecureChannel::new(&info.lsp_pubkey)?;
        let reply_key = ReplyKey::generate();
        let req = RegisterSubmarineRequest {
            encrypt_pubkey: reply_key.public_bytes(),
            payment_hash: payment_hash.to_vec(),
            repay_pubkey: refund_pubkey.to_vec(),
            destination: node_pubkey.to_vec(),
            swap_script_version: SCRIPT_VERSION,
        };
        let reply = self.transport.register_submarine(channel.seal(&req)?).await?;
        let rsp: RegisterSubmarineReply = reply_key.open(&reply)?;
        let htlc_key = parse_public_key(&rsp.htlc_pubkey)?;

        let node_info = self.node.get_info().await?;
        let network = network_from_name(&node_info.network)?;
        let script = submarine_script(&hash, &htlc_key, &refund_key, self.csv_height)?;

        let derived = Address::p2wsh(&script, network).to_string();
        if derived != rsp.script_address {
            tracing::error!(
                derived = %derived,
                lsp = %rsp.script_address,
                script = %hex::encode(script.as_bytes()),
                "swap address does not match LSP"
            );
            return Err(SwapError::ScriptMismatch {
                expected: derived,
                actual: rsp.script_address,
            });
        }

        let watched = self
            .node
            .add_watch_script(script.as_bytes(), &node_info.block_hash, node_info.block_height)
            .await?;
        if watched != rsp.script_address {
            tracing::error!(node = %watched, lsp = %rsp.script_address, "watched address does not match LSP");
            return Err(SwapError::ScriptMismatch {
                expected: watched,
                actual: rsp.script_address,
            });
        }

        tracing::info!(
            address = %rsp.script_address,
            height = node_info.block_height,
            "submarine swap registered"
        );
        Ok(SubmarineSwap {
            payment_hash: payment_hash.to_vec(),
            htlc_pubkey: rsp.htlc_pubkey,
            refund_pubkey: refund_pubkey.to_vec(),
            script: script.into_bytes(),
            script_address: rsp.script_address,
            height: node_info.block_height,
        })
    }

    /// Ask the LSP to pay `invoice` against the funded swap.
    pub async fn receive(
        &self,
        info: &ChannelInformation,
        payment_hash: &[u8],
        invoice: &str,
    ) -> Result<(), SwapError> {
        let channel = SecureChannel::new(&info.lsp_pubkey)?;
        let req = ReceiveSubmarineRequest {
            payment_hash: payment_hash.to_vec(),
            invoice: invoice.to_string(),
        };
        self.transport.receive_submarine(channel.seal(&req)?).await?;
        tracing::debug!(payment_hash = %hex::encode(payment_hash), "submarine receive requested");
        Ok(())
    }

    /// Sweep `inputs` to `address` through the refund path and broadcast.
    pub async fn repay(
        &self,
        inputs: &[RepayData],
        address: &str,
        label: &str,
    ) -> Result<Txid, SwapError> {
        let node_info = self.node.get_info().await?;
        let network = network_from_name(&node_info.network)?;
        let destination = Address::from_str(address)
            .map_err(|e| SwapError::InvalidAddress(format!("{address}: {e}")))?
            .require_network(network)
            .map_err(|e| SwapError::InvalidAddress(format!("{address}: {e}")))?
            .script_pubkey();

        let tx = build_refund_tx(inputs, destination, self.csv_height, self.fee_rate_sat_per_kw)?;
        let raw = serialize(&tx);
        tracing::debug!(rawtx = %hex::encode(&raw), "refund transaction");
        self.node.publish_transaction(&raw, label).await?;

        let txid = tx.compute_txid();
        tracing::info!(txid = %txid, inputs = inputs.len(), "refund published");
        Ok(txid)
    }

    /// Watch an already known swap script again from the current block.
    pub async fn reregister(&self, script: &[u8]) -> Result<String, SwapError> {
        let node_info = self.node.get_info().await?;
        let address = self
            .node
            .add_watch_script(script, &node_info.block_hash, node_info.block_height)
            .await?;
        tracing::debug!(address = %address, height = node_info.block_height, "swap script re-registered");
        Ok(address)
    }
}
