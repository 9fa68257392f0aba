//! Canonical demo network
//!
//! Six participants in a well-connected mesh, used by tests and demos that
//! need a non-trivial topology with multiple routes between most pairs.

use std::sync::Arc;

use crate::error::Result;
use crate::graph::{NodeId, TopologyStore};

/// Edges of the demo network, all weight 1
const DEMO_EDGES: [(u64, u64); 10] = [
    (1, 2),
    (1, 3),
    (2, 4),
    (3, 4),
    (3, 5),
    (4, 5),
    (4, 6),
    (5, 6),
    (2, 3),
    (1, 6),
];

/// Build the six-node demo topology over an in-memory mirror
pub fn demo_topology() -> Result<Arc<TopologyStore>> {
    let store = Arc::new(TopologyStore::in_memory());
    for id in 1..=6 {
        store.add_node(NodeId(id), &format!("user{id}"))?;
    }
    for (a, b) in DEMO_EDGES {
        store.add_edge(NodeId(a), NodeId(b), 1)?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathFinder;

    #[test]
    fn test_demo_topology_shape() {
        let store = demo_topology().unwrap();
        let stats = store.stats();

        assert_eq!(stats.nodes, 6);
        assert_eq!(stats.edges, 10);
        assert!(stats.connected);
        assert_eq!(stats.diameter, Some(2));
    }

    #[test]
    fn test_demo_topology_fully_routable() {
        let store = demo_topology().unwrap();
        let finder = PathFinder::new(store);

        for a in 1..=6 {
            for b in 1..=6 {
                assert!(finder.shortest_path(NodeId(a), NodeId(b)).is_some());
            }
        }
    }
}
