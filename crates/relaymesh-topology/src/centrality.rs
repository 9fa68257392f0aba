//! Centrality scoring of nodes and routes
//!
//! Structural importance scores over the participant graph, used to reason
//! about how exposed a route is: a path through high-betweenness hub nodes
//! crosses more of the network's traffic and is scored as less private.
//! Whether to prefer a lower-scoring route among candidates is caller
//! policy; nothing here selects routes.
//!
//! All three centralities follow hop-count (unweighted) shortest paths.
//! Every node of the graph appears in every returned map; an isolated node
//! scores 0 rather than being absent.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;

use crate::graph::{NodeId, Topology, TopologyStore};

/// All centrality scores for one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeCentrality {
    pub degree: f64,
    pub closeness: f64,
    pub betweenness: f64,
}

/// Degree centrality: degree / (N - 1), in [0, 1]
///
/// 0 for every node when the graph has fewer than two nodes.
pub fn degree_centrality(graph: &Topology) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    graph
        .node_ids()
        .map(|id| {
            let value = if n <= 1 {
                0.0
            } else {
                graph.degree(id) as f64 / (n - 1) as f64
            };
            (id, value)
        })
        .collect()
}

/// Closeness centrality with component scaling, in [0, 1]
///
/// For a node with `r` reachable nodes (itself included) and distance sum
/// `s` over them: `((r-1)/s) * ((r-1)/(N-1))`. A node that reaches nothing
/// scores 0 by definition; no division by zero ever happens.
pub fn closeness_centrality(graph: &Topology) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    graph
        .node_ids()
        .map(|id| {
            let dist = graph.bfs_distances(id);
            let reachable = dist.len();
            let sum: u64 = dist.values().sum();
            let value = if n <= 1 || reachable <= 1 || sum == 0 {
                0.0
            } else {
                let r = (reachable - 1) as f64;
                (r / sum as f64) * (r / (n - 1) as f64)
            };
            (id, value)
        })
        .collect()
}

/// Betweenness centrality (Brandes), normalized by 2 / ((N-1)(N-2))
///
/// Fraction of hop-count shortest paths between other node pairs that pass
/// through each node. Isolated nodes and endpoints score 0; every node is
/// present in the map.
pub fn betweenness_centrality(graph: &Topology) -> BTreeMap<NodeId, f64> {
    let mut centrality: BTreeMap<NodeId, f64> =
        graph.node_ids().map(|id| (id, 0.0)).collect();
    let n = graph.node_count();
    if n <= 2 {
        return centrality;
    }

    for source in graph.node_ids() {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut preds: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        let mut sigma: BTreeMap<NodeId, f64> = BTreeMap::new();
        let mut dist: BTreeMap<NodeId, u64> = BTreeMap::new();
        sigma.insert(source, 1.0);
        dist.insert(source, 0);

        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            stack.push(node);
            let node_dist = dist[&node];
            let node_sigma = sigma.get(&node).copied().unwrap_or(0.0);
            for (neighbor, _) in graph.neighbors(node) {
                if !dist.contains_key(&neighbor) {
                    dist.insert(neighbor, node_dist + 1);
                    queue.push_back(neighbor);
                }
                if dist[&neighbor] == node_dist + 1 {
                    *sigma.entry(neighbor).or_insert(0.0) += node_sigma;
                    preds.entry(neighbor).or_default().push(node);
                }
            }
        }

        // Dependency accumulation in reverse BFS order
        let mut delta: BTreeMap<NodeId, f64> = BTreeMap::new();
        while let Some(node) = stack.pop() {
            let node_delta = delta.get(&node).copied().unwrap_or(0.0);
            let node_sigma = sigma.get(&node).copied().unwrap_or(1.0);
            let coefficient = (1.0 + node_delta) / node_sigma;
            if let Some(parents) = preds.get(&node) {
                for &parent in parents {
                    let parent_sigma = sigma.get(&parent).copied().unwrap_or(0.0);
                    *delta.entry(parent).or_insert(0.0) += parent_sigma * coefficient;
                }
            }
            if node != source {
                *centrality.entry(node).or_insert(0.0) += node_delta;
            }
        }
    }

    // The accumulation counts each unordered pair from both endpoints, so
    // 1 / ((n-1)(n-2)) yields the usual 2 / ((n-1)(n-2)) normalization.
    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    for value in centrality.values_mut() {
        *value *= scale;
    }
    centrality
}

/// Mean betweenness over the nodes of a route
///
/// 0.0 for an empty path by definition. Path nodes missing from the graph
/// contribute 0. Lower means fewer shortest paths cross the route, so the
/// route is considered more private.
pub fn path_security_metric(graph: &Topology, path: &[NodeId]) -> f64 {
    if path.is_empty() {
        return 0.0;
    }
    let centrality = betweenness_centrality(graph);
    let total: f64 = path
        .iter()
        .map(|id| centrality.get(id).copied().unwrap_or(0.0))
        .sum();
    total / path.len() as f64
}

/// Centrality scoring over a shared topology store
///
/// Read-only: every method computes over one snapshot of the graph.
#[derive(Clone)]
pub struct SecurityScorer {
    topology: Arc<TopologyStore>,
}

impl SecurityScorer {
    /// Create a scorer over the given store
    pub fn new(topology: Arc<TopologyStore>) -> Self {
        SecurityScorer { topology }
    }

    /// Degree centrality for every node
    pub fn degree_centrality(&self) -> BTreeMap<NodeId, f64> {
        degree_centrality(&self.topology.read())
    }

    /// Closeness centrality for every node
    pub fn closeness_centrality(&self) -> BTreeMap<NodeId, f64> {
        closeness_centrality(&self.topology.read())
    }

    /// Betweenness centrality for every node
    pub fn betweenness_centrality(&self) -> BTreeMap<NodeId, f64> {
        betweenness_centrality(&self.topology.read())
    }

    /// All three centralities for one node, `None` if it does not exist
    pub fn node_centrality(&self, id: NodeId) -> Option<NodeCentrality> {
        let graph = self.topology.read();
        if !graph.contains(id) {
            return None;
        }
        Some(NodeCentrality {
            degree: degree_centrality(&graph).get(&id).copied().unwrap_or(0.0),
            closeness: closeness_centrality(&graph).get(&id).copied().unwrap_or(0.0),
            betweenness: betweenness_centrality(&graph)
                .get(&id)
                .copied()
                .unwrap_or(0.0),
        })
    }

    /// Exposure score of a candidate route (mean betweenness of its nodes)
    pub fn path_security_metric(&self, path: &[NodeId]) -> f64 {
        path_security_metric(&self.topology.read(), path)
    }
}

impl std::fmt::Debug for SecurityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityScorer").finish_non_exhaustive()
    }
}
