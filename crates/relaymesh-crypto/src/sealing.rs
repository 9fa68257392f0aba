//! Payload sealing using XChaCha20-Poly1305 AEAD
//!
//! Authenticated encryption for message payloads. Every seal draws a fresh
//! random nonce, so sealing the same plaintext twice never yields the same
//! ciphertext.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};

/// Size of the sealing nonce in bytes
pub const NONCE_SIZE: usize = 24;

/// Size of a symmetric transport key in bytes
pub const KEY_SIZE: usize = 32;

/// A nonce for sealing (must be unique for each message with the same key)
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a random nonce
    pub fn generate() -> Self {
        Nonce(XChaCha20Poly1305::generate_nonce(&mut OsRng).into())
    }

    /// Create a nonce from bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Nonce(bytes)
    }

    /// Get the nonce bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({}...)", hex::encode(&self.0[..8]))
    }
}

/// A participant's symmetric transport key
///
/// Key lifecycle (generation, rotation, distribution) belongs to the account
/// collaborator; this type only validates material handed to it. Transport
/// keys are distinct from any authentication secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generate a random symmetric key
    pub fn generate() -> Self {
        SymmetricKey(XChaCha20Poly1305::generate_key(&mut OsRng).into())
    }

    /// Create a key from bytes, rejecting anything but exactly 32 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(SymmetricKey(key))
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// A sealed payload with its nonce
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    /// The nonce used for sealing
    pub nonce: Nonce,
    /// The ciphertext (includes the authentication tag)
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Get the total size of the sealed message
    pub fn size(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }
}

impl std::fmt::Debug for SealedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedMessage")
            .field("nonce", &self.nonce)
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Seal a plaintext with a transport key
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedMessage> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key.0));
    let nonce = Nonce::generate();
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(SealedMessage { nonce, ciphertext })
}

/// Open a sealed message with a transport key
///
/// Fails on tag mismatch, truncated input, or the wrong key. There is no
/// partial output: a failed open means the message is unreadable.
pub fn open(key: &SymmetricKey, sealed: &SealedMessage) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key.0));
    cipher
        .decrypt(XNonce::from_slice(sealed.nonce.as_bytes()), sealed.ciphertext.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed)
}
