//! Aleph Crypto - at-rest encryption for configuration secrets
//!
//! The host stores its configuration as plain string key/value pairs; this
//! crate seals the one designated secret field (the API key) so it is never
//! persisted in plaintext. Decryption happens transiently, right before an
//! outgoing API call.

pub mod cipher;
pub mod keyfile;

pub use cipher::{is_encrypted, FieldCipher, ARMOR_PREFIX};

/// Errors that can occur in cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed - value may be corrupted or sealed with a different key")]
    Decryption,

    #[error("Value is not encrypted")]
    NotEncrypted,

    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
