//! Participant topology graph
//!
//! In-memory weighted undirected graph of participants, mirrored to durable
//! storage. Every mutation is written to the mirror first and applied to
//! memory only after the mirror accepts it, so both views change together or
//! not at all.
//!
//! The graph sits behind a single read-write lock: pathfinding, scoring, and
//! stats take read guards and may run concurrently; mutations take the write
//! guard and are exclusive.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::storage::{MemoryMirror, TopologyMirror};
use crate::{DEFAULT_MAX_EDGES_PER_NODE, DEFAULT_MAX_NODES};

/// Identifier of a participant in the topology
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node and its incident links
#[derive(Debug, Clone)]
struct NodeEntry {
    label: String,
    // BTreeMap keeps neighbor iteration ordered, which makes traversal
    // deterministic for a fixed graph.
    neighbors: BTreeMap<NodeId, u32>,
}

/// One consistent snapshot of the graph
///
/// Obtained through [`TopologyStore::read`]; pathfinding and scoring walk a
/// `&Topology` so an entire traversal observes a single state.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: BTreeMap<NodeId, NodeEntry>,
    edge_count: usize,
}

impl Topology {
    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether a node exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Display label of a node
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|entry| entry.label.as_str())
    }

    /// All node identifiers in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Neighbors of a node with link weights, in ascending neighbor order
    ///
    /// Empty for an absent or isolated node.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|entry| entry.neighbors.iter().map(|(&n, &w)| (n, w)))
    }

    /// Number of links incident to a node
    pub fn degree(&self, id: NodeId) -> usize {
        self.nodes.get(&id).map_or(0, |entry| entry.neighbors.len())
    }

    /// Weight of the edge between two nodes, if present
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<u32> {
        self.nodes.get(&a).and_then(|entry| entry.neighbors.get(&b).copied())
    }

    /// Unweighted (hop-count) distances from `source` to every reachable node
    pub(crate) fn bfs_distances(&self, source: NodeId) -> BTreeMap<NodeId, u64> {
        let mut dist = BTreeMap::new();
        if !self.contains(source) {
            return dist;
        }
        dist.insert(source, 0);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for (neighbor, _) in self.neighbors(node) {
                if !dist.contains_key(&neighbor) {
                    dist.insert(neighbor, d + 1);
                    queue.push_back(neighbor);
                }
            }
        }
        dist
    }

    fn insert_node(&mut self, id: NodeId, label: String) {
        self.nodes.insert(
            id,
            NodeEntry {
                label,
                neighbors: BTreeMap::new(),
            },
        );
    }

    fn remove_node(&mut self, id: NodeId) {
        if let Some(entry) = self.nodes.remove(&id) {
            self.edge_count -= entry.neighbors.len();
            for neighbor in entry.neighbors.keys() {
                if let Some(other) = self.nodes.get_mut(neighbor) {
                    other.neighbors.remove(&id);
                }
            }
        }
    }

    /// Insert or replace the undirected edge (a, b); returns true if new
    fn set_edge(&mut self, a: NodeId, b: NodeId, weight: u32) -> bool {
        let inserted = self
            .nodes
            .get_mut(&a)
            .map(|entry| entry.neighbors.insert(b, weight).is_none())
            .unwrap_or(false);
        if let Some(entry) = self.nodes.get_mut(&b) {
            entry.neighbors.insert(a, weight);
        }
        if inserted {
            self.edge_count += 1;
        }
        inserted
    }

    /// Remove the undirected edge (a, b); returns true if it existed
    fn unset_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        let removed = self
            .nodes
            .get_mut(&a)
            .map(|entry| entry.neighbors.remove(&b).is_some())
            .unwrap_or(false);
        if let Some(entry) = self.nodes.get_mut(&b) {
            entry.neighbors.remove(&a);
        }
        if removed {
            self.edge_count -= 1;
        }
        removed
    }
}

/// Overall network statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyStats {
    /// Total participant count
    pub nodes: usize,
    /// Total undirected edge count
    pub edges: usize,
    /// Mean node degree (0 for an empty graph)
    pub average_degree: f64,
    /// 2E / N(N-1), 0 when fewer than two nodes
    pub density: f64,
    /// Whether every node can reach every other (false for an empty graph)
    pub connected: bool,
    /// Hop-count diameter; `None` when the graph is empty or disconnected,
    /// never a numeric sentinel
    pub diameter: Option<u64>,
}

/// The shared participant graph with its durable mirror
pub struct TopologyStore {
    graph: RwLock<Topology>,
    mirror: Arc<dyn TopologyMirror>,
    max_nodes: usize,
    max_edges_per_node: usize,
}

impl TopologyStore {
    /// Create an empty store over the given mirror with default limits
    pub fn new(mirror: Arc<dyn TopologyMirror>) -> Self {
        Self::with_limits(mirror, DEFAULT_MAX_NODES, DEFAULT_MAX_EDGES_PER_NODE)
    }

    /// Create an empty store with explicit node and per-node link limits
    pub fn with_limits(
        mirror: Arc<dyn TopologyMirror>,
        max_nodes: usize,
        max_edges_per_node: usize,
    ) -> Self {
        TopologyStore {
            graph: RwLock::new(Topology::default()),
            mirror,
            max_nodes,
            max_edges_per_node,
        }
    }

    /// Create a store backed by an in-memory mirror (tests and demos)
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMirror::default()))
    }

    /// Rebuild the in-memory graph from the mirror's records
    ///
    /// Rejects duplicate node records and edges whose endpoints are missing,
    /// so a corrupt mirror cannot produce a graph that violates the topology
    /// invariants.
    pub fn load(mirror: Arc<dyn TopologyMirror>) -> Result<Self> {
        let mut graph = Topology::default();
        for record in mirror.load_nodes()? {
            if graph.contains(record.id) {
                return Err(TopologyError::DuplicateNode(record.id));
            }
            graph.insert_node(record.id, record.label);
        }
        for record in mirror.load_edges()? {
            if record.a == record.b {
                return Err(TopologyError::SelfLoop);
            }
            if record.weight < 1 {
                return Err(TopologyError::InvalidWeight(record.weight));
            }
            for endpoint in [record.a, record.b] {
                if !graph.contains(endpoint) {
                    return Err(TopologyError::EdgeEndpointMissing(endpoint));
                }
            }
            graph.set_edge(record.a, record.b, record.weight);
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "topology loaded from mirror"
        );
        Ok(TopologyStore {
            graph: RwLock::new(graph),
            mirror,
            max_nodes: DEFAULT_MAX_NODES,
            max_edges_per_node: DEFAULT_MAX_EDGES_PER_NODE,
        })
    }

    /// Take a read snapshot of the graph
    ///
    /// Readers may run concurrently with each other but never with a
    /// mutation; hold the guard for the whole traversal.
    pub fn read(&self) -> RwLockReadGuard<'_, Topology> {
        self.graph.read()
    }

    /// Provision a participant with no links
    pub fn add_node(&self, id: NodeId, label: &str) -> Result<()> {
        let mut graph = self.graph.write();
        if graph.contains(id) {
            return Err(TopologyError::DuplicateNode(id));
        }
        if graph.node_count() >= self.max_nodes {
            return Err(TopologyError::NodeLimitReached(self.max_nodes));
        }
        self.mirror.insert_node(id, label)?;
        graph.insert_node(id, label.to_string());
        debug!(node = %id, label, "node added");
        Ok(())
    }

    /// Deprovision a participant, cascading removal of every incident edge
    pub fn remove_node(&self, id: NodeId) -> Result<()> {
        let mut graph = self.graph.write();
        if !graph.contains(id) {
            return Err(TopologyError::NodeNotFound(id));
        }
        self.mirror.remove_node(id)?;
        graph.remove_node(id);
        debug!(node = %id, "node removed");
        Ok(())
    }

    /// Create or re-weight the undirected link between two participants
    ///
    /// Idempotent upsert: an existing edge has its weight replaced. Weights
    /// are positive; smaller means a cheaper, more trusted link.
    pub fn add_edge(&self, a: NodeId, b: NodeId, weight: u32) -> Result<()> {
        if a == b {
            return Err(TopologyError::SelfLoop);
        }
        if weight < 1 {
            return Err(TopologyError::InvalidWeight(weight));
        }
        let mut graph = self.graph.write();
        for endpoint in [a, b] {
            if !graph.contains(endpoint) {
                return Err(TopologyError::NodeNotFound(endpoint));
            }
        }
        if graph.edge_weight(a, b).is_none() {
            for endpoint in [a, b] {
                if graph.degree(endpoint) >= self.max_edges_per_node {
                    return Err(TopologyError::DegreeLimitReached(endpoint));
                }
            }
        }
        self.mirror.upsert_edge(a, b, weight)?;
        graph.set_edge(a, b, weight);
        debug!(a = %a, b = %b, weight, "edge upserted");
        Ok(())
    }

    /// Remove the undirected link between two participants
    ///
    /// Removing an absent edge is a successful no-op; (a, b) and (b, a) are
    /// the same edge.
    pub fn remove_edge(&self, a: NodeId, b: NodeId) -> Result<()> {
        let mut graph = self.graph.write();
        if graph.edge_weight(a, b).is_none() {
            return Ok(());
        }
        self.mirror.remove_edge(a, b)?;
        graph.unset_edge(a, b);
        debug!(a = %a, b = %b, "edge removed");
        Ok(())
    }

    /// Whether a participant exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.graph.read().contains(id)
    }

    /// Display label of a participant
    pub fn node_label(&self, id: NodeId) -> Option<String> {
        self.graph.read().label(id).map(str::to_string)
    }

    /// Connected participants with their labels
    ///
    /// Empty for an absent or isolated node; absence is not an error here.
    pub fn neighbors(&self, id: NodeId) -> Vec<(NodeId, String)> {
        let graph = self.graph.read();
        graph
            .neighbors(id)
            .map(|(neighbor, _)| {
                let label = graph.label(neighbor).unwrap_or_default().to_string();
                (neighbor, label)
            })
            .collect()
    }

    /// Overall network statistics over one snapshot
    pub fn stats(&self) -> TopologyStats {
        let graph = self.graph.read();
        let n = graph.node_count();
        let e = graph.edge_count();

        let average_degree = if n > 0 {
            (2 * e) as f64 / n as f64
        } else {
            0.0
        };
        let density = if n >= 2 {
            (2 * e) as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        let (connected, diameter) = match graph.node_ids().next() {
            None => (false, None),
            Some(first) => {
                if graph.bfs_distances(first).len() < n {
                    (false, None)
                } else {
                    let diameter = graph
                        .node_ids()
                        .map(|node| {
                            graph
                                .bfs_distances(node)
                                .values()
                                .copied()
                                .max()
                                .unwrap_or(0)
                        })
                        .max();
                    (true, diameter)
                }
            }
        };

        TopologyStats {
            nodes: n,
            edges: e,
            average_degree,
            density,
            connected,
            diameter,
        }
    }
}

impl std::fmt::Debug for TopologyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph.read();
        f.debug_struct("TopologyStore")
            .field("nodes", &graph.node_count())
            .field("edges", &graph.edge_count())
            .finish()
    }
}
