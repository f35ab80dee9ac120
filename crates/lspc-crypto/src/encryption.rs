use bitcoin::secp256k1::ecdh::SharedSecret;
use bitcoin::secp256k1::{PublicKey, SecretKey};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::keys::{parse_public_key, KeyPair};

const KDF_CONTEXT: &str = "lspclient secure-channel 2024 chacha20poly1305 v1";
const PUBKEY_LEN: usize = 33;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Sealed message: ephemeral public key, nonce and ciphertext with tag.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// Compressed secp256k1 key of the sender's one-off key pair.
    pub ephemeral_pubkey: [u8; PUBKEY_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the 16-byte Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Serialize to bytes: ephemeral_pubkey (33) + nonce (12) + ciphertext (variable).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PUBKEY_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.ephemeral_pubkey);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < PUBKEY_LEN + NONCE_LEN + TAG_LEN {
            return Err(CryptoError::DecryptionError("payload too short".into()));
        }
        let mut ephemeral_pubkey = [0u8; PUBKEY_LEN];
        ephemeral_pubkey.copy_from_slice(&bytes[..PUBKEY_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[PUBKEY_LEN..PUBKEY_LEN + NONCE_LEN]);
        Ok(Self {
            ephemeral_pubkey,
            nonce,
            ciphertext: bytes[PUBKEY_LEN + NONCE_LEN..].to_vec(),
        })
    }
}

fn cipher_for(point: &PublicKey, scalar: &SecretKey) -> Result<ChaCha20Poly1305, CryptoError> {
    let shared = SharedSecret::new(point, scalar);
    let mut secret = shared.secret_bytes();
    let mut key = blake3::derive_key(KDF_CONTEXT, &secret);
    secret.zeroize();
    let cipher = ChaCha20Poly1305::new_from_slice(&key)
        .map_err(|e| CryptoError::EncryptionError(format!("cipher init failed: {e}")));
    key.zeroize();
    cipher
}

/// Encrypt `plaintext` to `peer_pubkey`.
///
/// A fresh key pair is drawn for every call; ECDH with the peer key is
/// stretched through BLAKE3 into a ChaCha20-Poly1305 key. The output is
/// [`EncryptedPayload::to_bytes`].
pub fn encrypt(peer_pubkey: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = KeyPair::generate();
    let cipher = cipher_for(peer_pubkey, ephemeral.secret_key())?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::EncryptionError(format!("encryption failed: {e}")))?;

    Ok(EncryptedPayload {
        ephemeral_pubkey: ephemeral.public_bytes(),
        nonce: nonce_bytes,
        ciphertext,
    }
    .to_bytes())
}

/// Decrypt bytes produced by [`encrypt`] with the recipient's secret key.
pub fn decrypt(secret: &SecretKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let payload = EncryptedPayload::from_bytes(ciphertext)?;
    let ephemeral = parse_public_key(&payload.ephemeral_pubkey)?;
    let cipher = cipher_for(&ephemeral, secret)?;
    cipher
        .decrypt(Nonce::from_slice(&payload.nonce), payload.ciphertext.as_slice())
        .map_err(|e| CryptoError::DecryptionError(format!("decryption failed: {e}")))
}
