//! Durable mirror of the topology
//!
//! The persistence collaborator implements [`TopologyMirror`]; the store
//! writes every mutation here before touching its in-memory graph.
//! [`MemoryMirror`] is the reference implementation used in tests and demos.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopologyError};
use crate::graph::NodeId;

/// Durable record of a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: String,
}

/// Durable record of an undirected weighted link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: u32,
}

/// Durable storage for nodes and edges
///
/// Implementations must treat (a, b) and (b, a) as the same edge and must
/// cascade edge removal when a node is removed. A failed mutation must leave
/// the durable state unchanged; the store relies on that to keep memory and
/// mirror in step.
pub trait TopologyMirror: Send + Sync {
    /// Persist a new node
    fn insert_node(&self, id: NodeId, label: &str) -> Result<()>;

    /// Remove a node and every edge touching it
    fn remove_node(&self, id: NodeId) -> Result<()>;

    /// Insert or re-weight an undirected edge
    fn upsert_edge(&self, a: NodeId, b: NodeId, weight: u32) -> Result<()>;

    /// Remove an undirected edge if present
    fn remove_edge(&self, a: NodeId, b: NodeId) -> Result<()>;

    /// All persisted nodes
    fn load_nodes(&self) -> Result<Vec<NodeRecord>>;

    /// All persisted edges
    fn load_edges(&self) -> Result<Vec<EdgeRecord>>;
}

#[derive(Debug, Default)]
struct MirrorState {
    nodes: BTreeMap<NodeId, String>,
    // Keyed by the canonical (min, max) pair
    edges: BTreeMap<(NodeId, NodeId), u32>,
}

/// In-memory mirror implementation
#[derive(Debug, Default)]
pub struct MemoryMirror {
    state: Mutex<MirrorState>,
}

fn canonical(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl TopologyMirror for MemoryMirror {
    fn insert_node(&self, id: NodeId, label: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.nodes.contains_key(&id) {
            return Err(TopologyError::Mirror(format!("node {id} already persisted")));
        }
        state.nodes.insert(id, label.to_string());
        Ok(())
    }

    fn remove_node(&self, id: NodeId) -> Result<()> {
        let mut state = self.state.lock();
        state.nodes.remove(&id);
        state.edges.retain(|&(a, b), _| a != id && b != id);
        Ok(())
    }

    fn upsert_edge(&self, a: NodeId, b: NodeId, weight: u32) -> Result<()> {
        self.state.lock().edges.insert(canonical(a, b), weight);
        Ok(())
    }

    fn remove_edge(&self, a: NodeId, b: NodeId) -> Result<()> {
        self.state.lock().edges.remove(&canonical(a, b));
        Ok(())
    }

    fn load_nodes(&self) -> Result<Vec<NodeRecord>> {
        Ok(self
            .state
            .lock()
            .nodes
            .iter()
            .map(|(&id, label)| NodeRecord {
                id,
                label: label.clone(),
            })
            .collect())
    }

    fn load_edges(&self) -> Result<Vec<EdgeRecord>> {
        Ok(self
            .state
            .lock()
            .edges
            .iter()
            .map(|(&(a, b), &weight)| EdgeRecord { a, b, weight })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_pair_is_canonicalized() {
        let mirror = MemoryMirror::default();
        mirror.insert_node(NodeId(1), "a").unwrap();
        mirror.insert_node(NodeId(2), "b").unwrap();

        mirror.upsert_edge(NodeId(2), NodeId(1), 3).unwrap();
        mirror.upsert_edge(NodeId(1), NodeId(2), 5).unwrap();

        let edges = mirror.load_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].weight, 5);

        mirror.remove_edge(NodeId(2), NodeId(1)).unwrap();
        assert!(mirror.load_edges().unwrap().is_empty());
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mirror = MemoryMirror::default();
        for id in 1..=3 {
            mirror.insert_node(NodeId(id), "n").unwrap();
        }
        mirror.upsert_edge(NodeId(1), NodeId(2), 1).unwrap();
        mirror.upsert_edge(NodeId(2), NodeId(3), 1).unwrap();
        mirror.upsert_edge(NodeId(1), NodeId(3), 1).unwrap();

        mirror.remove_node(NodeId(2)).unwrap();

        assert_eq!(mirror.load_nodes().unwrap().len(), 2);
        assert_eq!(
            mirror.load_edges().unwrap(),
            vec![EdgeRecord {
                a: NodeId(1),
                b: NodeId(3),
                weight: 1
            }]
        );
    }

    #[test]
    fn test_duplicate_node_refused() {
        let mirror = MemoryMirror::default();
        mirror.insert_node(NodeId(1), "a").unwrap();
        assert!(mirror.insert_node(NodeId(1), "b").is_err());
    }
}
