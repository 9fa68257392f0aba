//! Messenger error types
//!
//! `send` has its own failure enum because every expected negative outcome
//! (no route, unknown receiver, oversized payload) is an ordinary result the
//! caller must branch on, with a short human-readable reason and nothing
//! else; internal state never crosses this boundary.

use relaymesh_crypto::CryptoError;
use relaymesh_topology::NodeId;
use thiserror::Error;

use crate::envelope::EnvelopeId;

/// Why a send did not produce an envelope
///
/// No envelope is persisted for any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("No valid path found between sender and receiver")]
    NoRoute { sender: NodeId, receiver: NodeId },

    #[error("Receiver not found")]
    ReceiverNotFound(NodeId),

    #[error("Message too large: {len} bytes (limit {max})")]
    MessageTooLarge { len: usize, max: usize },

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors from envelope-level operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    #[error("Envelope not found: {0}")]
    NotFound(EnvelopeId),

    #[error("Not a participant of this envelope")]
    Unauthorized,

    #[error("No transport key for participant {0}")]
    KeyUnavailable(NodeId),

    /// Tampering or key mismatch; surfaced uninterpreted, never repaired
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Result type for messenger operations
pub type Result<T> = std::result::Result<T, MessengerError>;
