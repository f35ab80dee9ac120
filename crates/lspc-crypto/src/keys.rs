use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// secp256k1 key pair. The secret scalar is erased on drop.
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        loop {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            let secret = SecretKey::from_slice(&bytes);
            bytes.zeroize();
            // Out-of-range scalars are astronomically rare; draw again.
            if let Ok(secret) = secret {
                return Self::from_secret(secret);
            }
        }
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Self { secret, public }
    }

    /// Create a key pair from a raw 32-byte secret.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let secret =
            SecretKey::from_slice(bytes).map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        Ok(Self::from_secret(secret))
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Compressed SEC1 encoding of the public key.
    pub fn public_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public_bytes()))
            .finish_non_exhaustive()
    }
}

/// Parse a compressed or uncompressed secp256k1 public key.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    PublicKey::from_slice(bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}
