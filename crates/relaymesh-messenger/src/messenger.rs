//! Route-gated message delivery
//!
//! `RoutingMessenger` ties the pieces together: a send resolves a route over
//! the topology, seals the plaintext with the receiver's transport key, and
//! persists the envelope. Read paths (inbox, history, summary) query the
//! store directly and never touch pathfinding.

use std::sync::Arc;

use relaymesh_crypto::{open, seal};
use relaymesh_topology::{NodeId, PathFinder, Route, TopologyStore};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MessengerConfig;
use crate::directory::KeyDirectory;
use crate::envelope::{now_millis, Envelope, EnvelopeId, EnvelopeStore};
use crate::error::{MessengerError, Result, SendError};

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Id of the persisted envelope
    pub envelope_id: EnvelopeId,
    /// The route the send was gated on; ephemeral, returned for caller
    /// inspection or scoring, never persisted
    pub route: Route,
}

/// An unread envelope with its sender's display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    pub envelope: Envelope,
    /// `None` when the sender has since been deprovisioned
    pub sender_label: Option<String>,
}

/// Per-participant message counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub total_sent: usize,
    pub total_received: usize,
    pub unread_count: usize,
}

/// Orchestrates pathfinding, sealing, and envelope persistence
pub struct RoutingMessenger {
    topology: Arc<TopologyStore>,
    finder: PathFinder,
    store: Arc<dyn EnvelopeStore>,
    keys: Arc<dyn KeyDirectory>,
    config: MessengerConfig,
}

impl RoutingMessenger {
    /// Create a messenger with default limits
    pub fn new(
        topology: Arc<TopologyStore>,
        store: Arc<dyn EnvelopeStore>,
        keys: Arc<dyn KeyDirectory>,
    ) -> Self {
        Self::with_config(topology, store, keys, MessengerConfig::default())
    }

    /// Create a messenger with explicit limits
    pub fn with_config(
        topology: Arc<TopologyStore>,
        store: Arc<dyn EnvelopeStore>,
        keys: Arc<dyn KeyDirectory>,
        config: MessengerConfig,
    ) -> Self {
        let finder = PathFinder::new(topology.clone());
        RoutingMessenger {
            topology,
            finder,
            store,
            keys,
            config,
        }
    }

    /// Send an encrypted message from `sender` to `receiver`
    ///
    /// Resolve route, then seal, then persist; any failure aborts before an
    /// envelope exists. The route is resolved against the topology as of
    /// this call; a concurrent topology edit may make it stale before the
    /// envelope persists, which is accepted store-and-forward behavior, not
    /// a defect.
    pub fn send(
        &self,
        sender: NodeId,
        receiver: NodeId,
        plaintext: &[u8],
    ) -> std::result::Result<SendReceipt, SendError> {
        if plaintext.len() > self.config.max_message_len {
            return Err(SendError::MessageTooLarge {
                len: plaintext.len(),
                max: self.config.max_message_len,
            });
        }

        let route = match self.finder.shortest_path(sender, receiver) {
            Some(route) => route,
            // An absent receiver is "not found", not a mere routing gap
            None if !self.topology.contains(receiver) => {
                return Err(SendError::ReceiverNotFound(receiver));
            }
            None => return Err(SendError::NoRoute { sender, receiver }),
        };

        let key = self
            .keys
            .transport_key(receiver)
            .ok_or(SendError::ReceiverNotFound(receiver))?;

        let payload = seal(&key, plaintext)?;
        let envelope_id = self.store.append(sender, receiver, payload, now_millis());
        debug!(%sender, %receiver, %envelope_id, hops = route.hops(), "message sent");

        Ok(SendReceipt { envelope_id, route })
    }

    /// All unread envelopes for a participant, oldest first
    pub fn unread_for(&self, user: NodeId) -> Vec<InboxEntry> {
        self.store
            .unread_for(user)
            .into_iter()
            .map(|envelope| {
                let sender_label = self.topology.node_label(envelope.sender);
                InboxEntry {
                    envelope,
                    sender_label,
                }
            })
            .collect()
    }

    /// Conversation between two participants, both directions, oldest first
    pub fn history_between(&self, a: NodeId, b: NodeId) -> Vec<Envelope> {
        self.store.history_between(a, b)
    }

    /// Mark an envelope read; idempotent, false only for an absent id
    pub fn mark_read(&self, envelope_id: EnvelopeId) -> bool {
        self.store.mark_read(envelope_id)
    }

    /// Hard-delete an envelope on behalf of one of its participants
    pub fn delete(&self, envelope_id: EnvelopeId, requesting_user: NodeId) -> Result<()> {
        let envelope = self
            .store
            .get(envelope_id)
            .ok_or(MessengerError::NotFound(envelope_id))?;
        if requesting_user != envelope.sender && requesting_user != envelope.receiver {
            return Err(MessengerError::Unauthorized);
        }
        if !self.store.remove(envelope_id) {
            // Lost a race with another delete
            return Err(MessengerError::NotFound(envelope_id));
        }
        debug!(%envelope_id, user = %requesting_user, "envelope deleted");
        Ok(())
    }

    /// Decrypt an envelope for its receiver
    ///
    /// A crypto failure propagates uninterpreted: it means tampering or a
    /// key mismatch, and the message is simply unreadable.
    pub fn open_envelope(
        &self,
        envelope_id: EnvelopeId,
        requesting_user: NodeId,
    ) -> Result<Vec<u8>> {
        let envelope = self
            .store
            .get(envelope_id)
            .ok_or(MessengerError::NotFound(envelope_id))?;
        if requesting_user != envelope.receiver {
            return Err(MessengerError::Unauthorized);
        }
        let key = self
            .keys
            .transport_key(envelope.receiver)
            .ok_or(MessengerError::KeyUnavailable(envelope.receiver))?;
        Ok(open(&key, &envelope.payload)?)
    }

    /// Message counts for a participant, independent of routing
    pub fn summary(&self, user: NodeId) -> MessageSummary {
        MessageSummary {
            total_sent: self.store.sent_count(user),
            total_received: self.store.received_count(user),
            unread_count: self.store.unread_count(user),
        }
    }

    /// Remove envelopes older than the configured retention period
    pub fn purge_expired(&self) -> usize {
        let cutoff = now_millis().saturating_sub(self.config.retention.as_millis() as u64);
        let removed = self.store.purge_older_than(cutoff);
        if removed > 0 {
            info!(removed, "expired envelopes purged");
        }
        removed
    }
}

impl std::fmt::Debug for RoutingMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingMessenger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
