//! Transport key directory
//!
//! The account collaborator implements [`KeyDirectory`] to resolve a
//! participant to its long-lived transport key. Keys here are dedicated to
//! message sealing — never password hashes or other authentication secrets;
//! generation and rotation stay with the collaborator.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use relaymesh_crypto::SymmetricKey;
use relaymesh_topology::NodeId;

/// Resolves a participant to its transport key
pub trait KeyDirectory: Send + Sync {
    /// The participant's transport key, or `None` for an unknown participant
    fn transport_key(&self, id: NodeId) -> Option<SymmetricKey>;
}

/// In-memory key directory
#[derive(Debug, Default)]
pub struct MemoryKeyDirectory {
    keys: RwLock<BTreeMap<NodeId, SymmetricKey>>,
}

impl MemoryKeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a participant's transport key
    pub fn register(&self, id: NodeId, key: SymmetricKey) {
        self.keys.write().insert(id, key);
    }

    /// Drop a participant's key
    pub fn remove(&self, id: NodeId) {
        self.keys.write().remove(&id);
    }
}

impl KeyDirectory for MemoryKeyDirectory {
    fn transport_key(&self, id: NodeId) -> Option<SymmetricKey> {
        self.keys.read().get(&id).cloned()
    }
}
