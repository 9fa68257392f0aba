//! Route resolution over the topology
//!
//! Dijkstra shortest paths and exhaustive simple-path enumeration. Both are
//! read-only: they walk a single snapshot of the graph, so a concurrent
//! mutation can never be observed mid-traversal. A missing route is a
//! first-class negative result (`None` / empty), not an error.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::sync::Arc;

use crate::graph::{NodeId, Topology, TopologyStore};

/// An ordered node sequence from source to destination
///
/// Ephemeral: produced by pathfinding, consumed within the same operation,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Node sequence, source first, destination last
    pub nodes: Vec<NodeId>,
    /// Total link weight along the sequence
    pub weight: u64,
}

impl Route {
    /// Number of hops (edges) in the route
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Minimum-weight path between two nodes, if any
///
/// Dijkstra over positive link weights. Among equal-cost paths the one found
/// first by relaxation order wins; adjacency iteration is ordered, so the
/// result is deterministic for a fixed graph. Returns `None` when either
/// endpoint is absent or the nodes are disconnected.
pub fn shortest_path(graph: &Topology, source: NodeId, target: NodeId) -> Option<Route> {
    if !graph.contains(source) || !graph.contains(target) {
        return None;
    }
    if source == target {
        return Some(Route {
            nodes: vec![source],
            weight: 0,
        });
    }

    let mut dist: BTreeMap<NodeId, u64> = BTreeMap::new();
    let mut prev: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut heap = BinaryHeap::new();
    dist.insert(source, 0);
    heap.push(Reverse((0u64, source)));

    while let Some(Reverse((d, node))) = heap.pop() {
        if d > dist.get(&node).copied().unwrap_or(u64::MAX) {
            continue; // stale heap entry
        }
        if node == target {
            break;
        }
        for (neighbor, weight) in graph.neighbors(node) {
            let candidate = d + u64::from(weight);
            if candidate < dist.get(&neighbor).copied().unwrap_or(u64::MAX) {
                dist.insert(neighbor, candidate);
                prev.insert(neighbor, node);
                heap.push(Reverse((candidate, neighbor)));
            }
        }
    }

    let weight = dist.get(&target).copied()?;
    let mut nodes = vec![target];
    let mut cursor = target;
    while cursor != source {
        cursor = prev.get(&cursor).copied()?;
        nodes.push(cursor);
    }
    nodes.reverse();
    Some(Route { nodes, weight })
}

/// Lazy enumeration of every simple path between two nodes
///
/// Depth-first over the snapshot; each yielded route repeats no node.
/// Finite by construction and empty when no path exists. `source == target`
/// yields the single-node path.
pub fn simple_paths<'g>(graph: &'g Topology, source: NodeId, target: NodeId) -> SimplePaths<'g> {
    let mut paths = SimplePaths {
        graph,
        target,
        path: Vec::new(),
        edge_weights: Vec::new(),
        weight_sum: 0,
        visited: BTreeSet::new(),
        stack: Vec::new(),
        emit_trivial: false,
        done: false,
    };
    if !graph.contains(source) || !graph.contains(target) {
        paths.done = true;
    } else if source == target {
        paths.emit_trivial = true;
    } else {
        paths.path.push(source);
        paths.visited.insert(source);
        paths.stack.push(neighbor_list(graph, source));
    }
    paths
}

fn neighbor_list(graph: &Topology, node: NodeId) -> std::vec::IntoIter<(NodeId, u32)> {
    graph.neighbors(node).collect::<Vec<_>>().into_iter()
}

/// Iterator produced by [`simple_paths`]
pub struct SimplePaths<'g> {
    graph: &'g Topology,
    target: NodeId,
    path: Vec<NodeId>,
    edge_weights: Vec<u64>,
    weight_sum: u64,
    visited: BTreeSet<NodeId>,
    stack: Vec<std::vec::IntoIter<(NodeId, u32)>>,
    emit_trivial: bool,
    done: bool,
}

impl Iterator for SimplePaths<'_> {
    type Item = Route;

    fn next(&mut self) -> Option<Route> {
        if self.done {
            return None;
        }
        if self.emit_trivial {
            self.emit_trivial = false;
            self.done = true;
            return Some(Route {
                nodes: vec![self.target],
                weight: 0,
            });
        }

        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some((next, weight)) => {
                    if next == self.target {
                        let mut nodes = self.path.clone();
                        nodes.push(next);
                        return Some(Route {
                            nodes,
                            weight: self.weight_sum + u64::from(weight),
                        });
                    }
                    if self.visited.contains(&next) {
                        continue;
                    }
                    self.visited.insert(next);
                    self.path.push(next);
                    self.edge_weights.push(u64::from(weight));
                    self.weight_sum += u64::from(weight);
                    self.stack.push(neighbor_list(self.graph, next));
                }
                None => {
                    self.stack.pop();
                    if let Some(node) = self.path.pop() {
                        self.visited.remove(&node);
                        if let Some(weight) = self.edge_weights.pop() {
                            self.weight_sum -= weight;
                        }
                    }
                }
            }
        }

        self.done = true;
        None
    }
}

/// Route resolution over a shared topology store
#[derive(Clone)]
pub struct PathFinder {
    topology: Arc<TopologyStore>,
}

impl PathFinder {
    /// Create a finder over the given store
    pub fn new(topology: Arc<TopologyStore>) -> Self {
        PathFinder { topology }
    }

    /// Minimum-weight route between two participants, if any
    pub fn shortest_path(&self, source: NodeId, target: NodeId) -> Option<Route> {
        shortest_path(&self.topology.read(), source, target)
    }

    /// Every simple route between two participants
    ///
    /// Enumerated under one read snapshot; empty when none exist.
    pub fn all_simple_paths(&self, source: NodeId, target: NodeId) -> Vec<Route> {
        let graph = self.topology.read();
        simple_paths(&graph, source, target).collect()
    }
}

impl std::fmt::Debug for PathFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathFinder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    fn store_with(edges: &[(u64, u64, u32)]) -> Arc<TopologyStore> {
        let store = Arc::new(TopologyStore::in_memory());
        let mut seen = std::collections::BTreeSet::new();
        for &(a, b, _) in edges {
            for id in [a, b] {
                if seen.insert(id) {
                    store.add_node(NodeId(id), &format!("user{id}")).unwrap();
                }
            }
        }
        for &(a, b, w) in edges {
            store.add_edge(NodeId(a), NodeId(b), w).unwrap();
        }
        store
    }

    #[test]
    fn test_weighted_shortest_path_prefers_cheap_detour() {
        // (1-2, w1), (2-3, w1), (1-3, w5): the two-hop route wins
        let store = store_with(&[(1, 2, 1), (2, 3, 1), (1, 3, 5)]);
        let finder = PathFinder::new(store);

        let route = finder.shortest_path(NodeId(1), NodeId(3)).unwrap();
        assert_eq!(route.nodes, ids(&[1, 2, 3]));
        assert_eq!(route.weight, 2);
        assert_eq!(route.hops(), 2);
    }

    #[test]
    fn test_no_path_is_none_not_error() {
        let store = store_with(&[(1, 2, 1), (3, 4, 1)]);
        let finder = PathFinder::new(store);

        assert_eq!(finder.shortest_path(NodeId(1), NodeId(3)), None);
        assert!(finder.all_simple_paths(NodeId(1), NodeId(3)).is_empty());
    }

    #[test]
    fn test_absent_endpoints() {
        let store = store_with(&[(1, 2, 1)]);
        let finder = PathFinder::new(store);

        assert_eq!(finder.shortest_path(NodeId(1), NodeId(99)), None);
        assert_eq!(finder.shortest_path(NodeId(99), NodeId(1)), None);
        assert!(finder.all_simple_paths(NodeId(99), NodeId(1)).is_empty());
    }

    #[test]
    fn test_source_equals_target() {
        let store = store_with(&[(1, 2, 1)]);
        let finder = PathFinder::new(store);

        let route = finder.shortest_path(NodeId(1), NodeId(1)).unwrap();
        assert_eq!(route.nodes, ids(&[1]));
        assert_eq!(route.weight, 0);

        let all = finder.all_simple_paths(NodeId(1), NodeId(1));
        assert_eq!(all, vec![route]);
    }

    #[test]
    fn test_reweight_changes_route() {
        let store = store_with(&[(1, 2, 1), (2, 3, 1), (1, 3, 5)]);
        let finder = PathFinder::new(store.clone());

        // Make the direct link the cheapest
        store.add_edge(NodeId(1), NodeId(3), 1).unwrap();
        let route = finder.shortest_path(NodeId(1), NodeId(3)).unwrap();
        assert_eq!(route.nodes, ids(&[1, 3]));
        assert_eq!(route.weight, 1);
    }

    #[test]
    fn test_removed_node_breaks_route() {
        let store = store_with(&[(1, 2, 1), (2, 3, 1)]);
        let finder = PathFinder::new(store.clone());
        assert!(finder.shortest_path(NodeId(1), NodeId(3)).is_some());

        store.remove_node(NodeId(2)).unwrap();
        assert_eq!(finder.shortest_path(NodeId(1), NodeId(3)), None);
        assert!(finder.all_simple_paths(NodeId(1), NodeId(3)).is_empty());
    }

    #[test]
    fn test_simple_paths_enumerates_square() {
        // 1-2, 2-4, 1-3, 3-4: exactly two simple paths from 1 to 4
        let store = store_with(&[(1, 2, 1), (2, 4, 1), (1, 3, 1), (3, 4, 2)]);
        let finder = PathFinder::new(store);

        let mut paths = finder.all_simple_paths(NodeId(1), NodeId(4));
        paths.sort_by_key(|route| route.nodes.clone());
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].nodes, ids(&[1, 2, 4]));
        assert_eq!(paths[0].weight, 2);
        assert_eq!(paths[1].nodes, ids(&[1, 3, 4]));
        assert_eq!(paths[1].weight, 3);
    }

    #[test]
    fn test_simple_paths_terminate_on_cycles() {
        // Complete graph on 4 nodes: finite enumeration despite many cycles
        let store = store_with(&[
            (1, 2, 1),
            (1, 3, 1),
            (1, 4, 1),
            (2, 3, 1),
            (2, 4, 1),
            (3, 4, 1),
        ]);
        let finder = PathFinder::new(store);

        let paths = finder.all_simple_paths(NodeId(1), NodeId(4));
        // Direct, 2 two-hop, 2 three-hop
        assert_eq!(paths.len(), 5);
        for route in &paths {
            let unique: BTreeSet<_> = route.nodes.iter().collect();
            assert_eq!(unique.len(), route.nodes.len(), "node repeated in {route:?}");
            assert_eq!(route.nodes.first(), Some(&NodeId(1)));
            assert_eq!(route.nodes.last(), Some(&NodeId(4)));
        }
    }

    #[test]
    fn test_shortest_matches_simple_path_minimum() {
        let store = store_with(&[
            (1, 2, 1),
            (1, 3, 1),
            (2, 4, 3),
            (3, 4, 1),
            (3, 5, 4),
            (4, 5, 1),
            (4, 6, 2),
            (5, 6, 1),
            (2, 3, 1),
            (1, 6, 9),
        ]);
        let finder = PathFinder::new(store.clone());

        let graph = store.read();
        for source in graph.node_ids() {
            for target in graph.node_ids() {
                let best = finder.shortest_path(source, target);
                let brute = simple_paths(&graph, source, target)
                    .map(|route| route.weight)
                    .min();
                assert_eq!(
                    best.as_ref().map(|route| route.weight),
                    brute,
                    "mismatch for {source} -> {target}"
                );
            }
        }
    }

    #[test]
    fn test_randomized_minimality() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..20 {
            let store = Arc::new(TopologyStore::in_memory());
            let n = 7;
            for id in 0..n {
                store.add_node(NodeId(id), &format!("n{id}")).unwrap();
            }
            for a in 0..n {
                for b in (a + 1)..n {
                    if rng.gen_bool(0.4) {
                        store
                            .add_edge(NodeId(a), NodeId(b), rng.gen_range(1..=9))
                            .unwrap();
                    }
                }
            }

            let graph = store.read();
            for source in 0..n {
                for target in 0..n {
                    let best = shortest_path(&graph, NodeId(source), NodeId(target));
                    let brute = simple_paths(&graph, NodeId(source), NodeId(target))
                        .map(|route| route.weight)
                        .min();
                    assert_eq!(best.map(|route| route.weight), brute);
                }
            }
        }
    }
}
