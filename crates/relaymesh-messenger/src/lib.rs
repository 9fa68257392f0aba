//! Relaymesh Messenger
//!
//! Route-gated encrypted message delivery over the participant topology:
//! a message is sealed and persisted only when a transport route from
//! sender to receiver exists. Per send: resolve route, seal with the
//! receiver's transport key, persist the envelope. Inbox, history, and
//! summary are plain store queries.
//!
//! Collaborator seams:
//! - [`EnvelopeStore`] — durable append-only message storage
//! - [`KeyDirectory`] — participant id to transport key resolution

pub mod config;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod messenger;

pub use config::{MessengerConfig, DEFAULT_MAX_MESSAGE_LEN, DEFAULT_RETENTION};
pub use directory::{KeyDirectory, MemoryKeyDirectory};
pub use envelope::{Envelope, EnvelopeId, EnvelopeStore, MemoryEnvelopeStore};
pub use error::{MessengerError, Result, SendError};
pub use messenger::{InboxEntry, MessageSummary, RoutingMessenger, SendReceipt};
