pub mod encryption;
pub mod error;
pub mod keys;
pub mod secure;

pub use encryption::{decrypt, encrypt, EncryptedPayload};
pub use error::CryptoError;
pub use keys::{parse_public_key, KeyPair};
pub use secure::{ReplyKey, SecureChannel};
