//! Envelope records and the durable message store
//!
//! The persistence collaborator implements [`EnvelopeStore`]; every method
//! is an atomic per-row transition, so concurrent mark-read and delete on
//! the same envelope can never corrupt it (delete wins — the row stops
//! existing). [`MemoryEnvelopeStore`] is the reference implementation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use relaymesh_crypto::SealedMessage;
use relaymesh_topology::NodeId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier of a persisted envelope, store-assigned and increasing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EnvelopeId(pub u64);

impl std::fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted encrypted message
///
/// Immutable once written except for the `read` flag, which only ever flips
/// false to true. The payload is opaque outside the crypto engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,
    pub sender: NodeId,
    pub receiver: NodeId,
    pub payload: SealedMessage,
    /// Creation time, unix milliseconds
    pub sent_at: u64,
    pub read: bool,
}

/// Current unix time in milliseconds, with a non-panicking fallback
///
/// A clock before the epoch yields 0 rather than crashing a send.
pub(crate) fn now_millis() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis() as u64,
        Err(error) => {
            warn!(%error, "system clock before unix epoch, using fallback timestamp");
            0
        }
    }
}

/// Durable storage for envelopes
///
/// Query results are ordered by timestamp ascending with envelope id as the
/// stable tie-break.
pub trait EnvelopeStore: Send + Sync {
    /// Persist a new unread envelope, returning its id
    fn append(
        &self,
        sender: NodeId,
        receiver: NodeId,
        payload: SealedMessage,
        sent_at: u64,
    ) -> EnvelopeId;

    /// Fetch one envelope by id
    fn get(&self, id: EnvelopeId) -> Option<Envelope>;

    /// All unread envelopes addressed to `receiver`
    fn unread_for(&self, receiver: NodeId) -> Vec<Envelope>;

    /// All envelopes between two participants, in either direction
    fn history_between(&self, a: NodeId, b: NodeId) -> Vec<Envelope>;

    /// Envelopes sent by `user`
    fn sent_count(&self, user: NodeId) -> usize;

    /// Envelopes addressed to `user`
    fn received_count(&self, user: NodeId) -> usize;

    /// Unread envelopes addressed to `user`
    fn unread_count(&self, user: NodeId) -> usize;

    /// Flip the read flag; false only when the id is absent (idempotent)
    fn mark_read(&self, id: EnvelopeId) -> bool;

    /// Hard-remove an envelope; false when the id is absent
    fn remove(&self, id: EnvelopeId) -> bool;

    /// Remove every envelope created before `cutoff_millis`, returning the count
    fn purge_older_than(&self, cutoff_millis: u64) -> usize;
}

/// In-memory envelope store
#[derive(Debug, Default)]
pub struct MemoryEnvelopeStore {
    rows: RwLock<BTreeMap<EnvelopeId, Envelope>>,
    next_id: AtomicU64,
}

impl MemoryEnvelopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_sorted(&self, keep: impl Fn(&Envelope) -> bool) -> Vec<Envelope> {
        let rows = self.rows.read();
        let mut matches: Vec<Envelope> = rows.values().filter(|e| keep(e)).cloned().collect();
        matches.sort_by_key(|envelope| (envelope.sent_at, envelope.id));
        matches
    }
}

impl EnvelopeStore for MemoryEnvelopeStore {
    fn append(
        &self,
        sender: NodeId,
        receiver: NodeId,
        payload: SealedMessage,
        sent_at: u64,
    ) -> EnvelopeId {
        let id = EnvelopeId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let envelope = Envelope {
            id,
            sender,
            receiver,
            payload,
            sent_at,
            read: false,
        };
        self.rows.write().insert(id, envelope);
        id
    }

    fn get(&self, id: EnvelopeId) -> Option<Envelope> {
        self.rows.read().get(&id).cloned()
    }

    fn unread_for(&self, receiver: NodeId) -> Vec<Envelope> {
        self.collect_sorted(|e| e.receiver == receiver && !e.read)
    }

    fn history_between(&self, a: NodeId, b: NodeId) -> Vec<Envelope> {
        self.collect_sorted(|e| {
            (e.sender == a && e.receiver == b) || (e.sender == b && e.receiver == a)
        })
    }

    fn sent_count(&self, user: NodeId) -> usize {
        self.rows.read().values().filter(|e| e.sender == user).count()
    }

    fn received_count(&self, user: NodeId) -> usize {
        self.rows.read().values().filter(|e| e.receiver == user).count()
    }

    fn unread_count(&self, user: NodeId) -> usize {
        self.rows
            .read()
            .values()
            .filter(|e| e.receiver == user && !e.read)
            .count()
    }

    fn mark_read(&self, id: EnvelopeId) -> bool {
        match self.rows.write().get_mut(&id) {
            Some(envelope) => {
                envelope.read = true;
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: EnvelopeId) -> bool {
        self.rows.write().remove(&id).is_some()
    }

    fn purge_older_than(&self, cutoff_millis: u64) -> usize {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|_, envelope| envelope.sent_at >= cutoff_millis);
        before - rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaymesh_crypto::{seal, SymmetricKey};

    fn payload() -> SealedMessage {
        seal(&SymmetricKey::generate(), b"payload").unwrap()
    }

    #[test]
    fn test_ids_are_assigned_in_order() {
        let store = MemoryEnvelopeStore::new();
        let first = store.append(NodeId(1), NodeId(2), payload(), 10);
        let second = store.append(NodeId(1), NodeId(2), payload(), 10);
        assert!(second > first);
    }

    #[test]
    fn test_unread_filtering_and_order() {
        let store = MemoryEnvelopeStore::new();
        let a = store.append(NodeId(1), NodeId(2), payload(), 30);
        let b = store.append(NodeId(3), NodeId(2), payload(), 10);
        store.append(NodeId(2), NodeId(1), payload(), 20); // other direction
        let d = store.append(NodeId(1), NodeId(2), payload(), 10);

        store.mark_read(a);

        let unread: Vec<EnvelopeId> =
            store.unread_for(NodeId(2)).into_iter().map(|e| e.id).collect();
        // Timestamp ascending, id as the tie-break
        assert_eq!(unread, vec![b, d]);
    }

    #[test]
    fn test_history_covers_both_directions() {
        let store = MemoryEnvelopeStore::new();
        let a = store.append(NodeId(1), NodeId(2), payload(), 10);
        let b = store.append(NodeId(2), NodeId(1), payload(), 20);
        store.append(NodeId(1), NodeId(3), payload(), 15); // different pair

        let history: Vec<EnvelopeId> = store
            .history_between(NodeId(2), NodeId(1))
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(history, vec![a, b]);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let store = MemoryEnvelopeStore::new();
        let id = store.append(NodeId(1), NodeId(2), payload(), 10);

        assert!(store.mark_read(id));
        let after_first = store.get(id).unwrap();

        assert!(store.mark_read(id));
        assert_eq!(store.get(id).unwrap(), after_first);

        assert!(!store.mark_read(EnvelopeId(999)));
    }

    #[test]
    fn test_remove() {
        let store = MemoryEnvelopeStore::new();
        let id = store.append(NodeId(1), NodeId(2), payload(), 10);

        assert!(store.remove(id));
        assert_eq!(store.get(id), None);
        assert!(!store.remove(id));
    }

    #[test]
    fn test_counts() {
        let store = MemoryEnvelopeStore::new();
        store.append(NodeId(1), NodeId(2), payload(), 10);
        store.append(NodeId(1), NodeId(3), payload(), 11);
        let incoming = store.append(NodeId(2), NodeId(1), payload(), 12);

        assert_eq!(store.sent_count(NodeId(1)), 2);
        assert_eq!(store.received_count(NodeId(1)), 1);
        assert_eq!(store.unread_count(NodeId(1)), 1);

        store.mark_read(incoming);
        assert_eq!(store.unread_count(NodeId(1)), 0);
    }

    #[test]
    fn test_purge_older_than() {
        let store = MemoryEnvelopeStore::new();
        store.append(NodeId(1), NodeId(2), payload(), 100);
        let kept = store.append(NodeId(1), NodeId(2), payload(), 200);

        assert_eq!(store.purge_older_than(150), 1);
        assert_eq!(store.get(kept).map(|e| e.id), Some(kept));
        assert_eq!(store.purge_older_than(150), 0);
    }
}
