//! ChaCha20-Poly1305 field encryption
//!
//! Why ChaCha20-Poly1305?
//! - Constant-time (no timing attacks)
//! - No weak keys
//! - Faster than AES on systems without AES-NI
//!
//! Sealed values are armored as `v1:<base64(nonce || ciphertext || tag)>`.
//! The nonce is prepended so decryption needs no external state, and the
//! armor prefix lets callers recognize an encrypted value without trying
//! to decrypt it (the upgrade path relies on this).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// 256-bit key (32 bytes)
pub const KEY_SIZE: usize = 32;
/// 96-bit nonce (12 bytes)
pub const NONCE_SIZE: usize = 12;
/// Marks a stored value as sealed by this cipher.
pub const ARMOR_PREFIX: &str = "v1:";

/// Returns true when a stored value carries the armor prefix.
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ARMOR_PREFIX)
}

/// Encrypts and decrypts single configuration fields.
///
/// The key is wrapped in `Zeroizing<>` so it is scrubbed from memory on
/// drop. No lingering key material.
pub struct FieldCipher {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl FieldCipher {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Generate a cipher with a fresh random key.
    pub fn generate() -> Self {
        let generated = ChaCha20Poly1305::generate_key(&mut OsRng);
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&generated);
        Self { key }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeySize {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Raw key bytes, for persistence by the key file helper.
    pub fn key_bytes(&self) -> &[u8] {
        self.key.as_ref()
    }

    /// Seal a plaintext field value into an armored string.
    pub fn encrypt_field(&self, plaintext: &str) -> Result<String> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.key.as_ref()));
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;

        // Prepend nonce to ciphertext
        let mut raw = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);

        Ok(format!("{ARMOR_PREFIX}{}", BASE64.encode(raw)))
    }

    /// Open an armored value produced by [`encrypt_field`](Self::encrypt_field).
    pub fn decrypt_field(&self, armored: &str) -> Result<String> {
        let encoded = armored
            .strip_prefix(ARMOR_PREFIX)
            .ok_or(CryptoError::NotEncrypted)?;
        let raw = BASE64.decode(encoded).map_err(|_| CryptoError::Decryption)?;
        if raw.len() < NONCE_SIZE {
            return Err(CryptoError::Decryption);
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.key.as_ref()));

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
    }
}
