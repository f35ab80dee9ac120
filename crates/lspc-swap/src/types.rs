use bitcoin::hashes::{sha256, Hash};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use lspc_crypto::KeyPair;

/// Fresh secrets for one swap. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SwapKeys {
    pub preimage: [u8; 32],
    pub payment_hash: [u8; 32],
    pub refund_privkey: [u8; 32],
    pub refund_pubkey: [u8; 33],
}

impl SwapKeys {
    /// Random preimage, its SHA-256 and a new refund key pair.
    pub fn generate() -> Self {
        let mut preimage = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut preimage);
        let payment_hash = sha256::Hash::hash(&preimage).to_byte_array();
        let refund = KeyPair::generate();
        Self {
            preimage,
            payment_hash,
            refund_privkey: refund.secret_bytes(),
            refund_pubkey: refund.public_bytes(),
        }
    }
}

impl std::fmt::Debug for SwapKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapKeys")
            .field("payment_hash", &hex::encode(self.payment_hash))
            .field("refund_pubkey", &hex::encode(self.refund_pubkey))
            .finish_non_exhaustive()
    }
}

/// A swap registered with the LSP and verified against our own derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmarineSwap {
    pub payment_hash: Vec<u8>,
    pub htlc_pubkey: Vec<u8>,
    pub refund_pubkey: Vec<u8>,
    /// Redeem script.
    pub script: Vec<u8>,
    /// P2WSH address of `script`.
    pub script_address: String,
    /// Block height at registration.
    pub height: u32,
}

/// One swap output to sweep back through the refund path.
#[derive(Clone)]
pub struct RepayData {
    pub script: Vec<u8>,
    /// Funding txid in display (big-endian) hex.
    pub txid: String,
    pub index: u32,
    pub amount_sat: u64,
    pub refund_privkey: [u8; 32],
}

impl Drop for RepayData {
    fn drop(&mut self) {
        self.refund_privkey.zeroize();
    }
}

impl std::fmt::Debug for RepayData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepayData")
            .field("txid", &self.txid)
            .field("index", &self.index)
            .field("amount_sat", &self.amount_sat)
            .field("script", &hex::encode(&self.script))
            .finish_non_exhaustive()
    }
}
