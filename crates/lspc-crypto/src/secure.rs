//! Per-call sealing of protobuf messages exchanged with the LSP.
//!
//! Requests are sealed to the LSP's long-term key. Calls that expect an
//! encrypted answer carry the public half of a fresh [`ReplyKey`] inside the
//! request; the reply is opened with its secret half and the key is dropped.

use bitcoin::secp256k1::PublicKey;
use lspc_core::proto::lspd::Encrypted;
use prost::Message;

use crate::encryption::{decrypt, encrypt};
use crate::error::CryptoError;
use crate::keys::{parse_public_key, KeyPair};

/// Sealing side of the channel, bound to one LSP key.
#[derive(Debug, Clone)]
pub struct SecureChannel {
    lsp_pubkey: PublicKey,
}

impl SecureChannel {
    pub fn new(lsp_pubkey: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            lsp_pubkey: parse_public_key(lsp_pubkey)?,
        })
    }

    /// Serialize and encrypt `msg` for the LSP.
    pub fn seal_bytes<M: Message>(&self, msg: &M) -> Result<Vec<u8>, CryptoError> {
        encrypt(&self.lsp_pubkey, &msg.encode_to_vec())
    }

    /// Same as [`seal_bytes`](Self::seal_bytes), wrapped in the wire envelope.
    pub fn seal<M: Message>(&self, msg: &M) -> Result<Encrypted, CryptoError> {
        Ok(Encrypted {
            data: self.seal_bytes(msg)?,
        })
    }
}

/// One-off key an encrypted reply is sealed to.
#[derive(Debug)]
pub struct ReplyKey {
    key: KeyPair,
}

impl ReplyKey {
    pub fn generate() -> Self {
        Self {
            key: KeyPair::generate(),
        }
    }

    /// Compressed public key to embed in the request.
    pub fn public_bytes(&self) -> Vec<u8> {
        self.key.public_bytes().to_vec()
    }

    /// Decrypt and decode a reply sealed to this key.
    pub fn open<M: Message + Default>(&self, envelope: &Encrypted) -> Result<M, CryptoError> {
        let plaintext = decrypt(self.key.secret_key(), &envelope.data)?;
        Ok(M::decode(plaintext.as_slice())?)
    }
}
