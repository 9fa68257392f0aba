//! Relaymesh Cryptography Module
//!
//! Authenticated symmetric encryption for message payloads:
//! - Per-participant transport keys (32-byte symmetric keys)
//! - Payload sealing (XChaCha20-Poly1305 AEAD, fresh nonce per message)
//!
//! The sealed payload is opaque to every other component; callers that need
//! a text transport must base64-encode the ciphertext themselves.

pub mod error;
pub mod sealing;

pub use error::{CryptoError, Result};
pub use sealing::{open, seal, Nonce, SealedMessage, SymmetricKey, KEY_SIZE, NONCE_SIZE};
