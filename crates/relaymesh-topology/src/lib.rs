//! Relaymesh Topology
//!
//! The participant topology and everything computed over it:
//! - Mutable weighted undirected graph mirrored to durable storage
//! - Dijkstra routing and exhaustive simple-path enumeration
//! - Centrality scoring for route privacy ranking
//! - Network statistics
//!
//! The graph lives behind a single read-write lock: pathfinding, scoring,
//! and stats are readers that may run concurrently; mutations are exclusive
//! writers. Every mutation applies to the durable mirror and the in-memory
//! graph together or not at all.

pub mod centrality;
pub mod demo;
pub mod error;
pub mod graph;
pub mod paths;
pub mod storage;

pub use centrality::{
    betweenness_centrality, closeness_centrality, degree_centrality, path_security_metric,
    NodeCentrality, SecurityScorer,
};
pub use demo::demo_topology;
pub use error::{Result, TopologyError};
pub use graph::{NodeId, Topology, TopologyStats, TopologyStore};
pub use paths::{shortest_path, simple_paths, PathFinder, Route, SimplePaths};
pub use storage::{EdgeRecord, MemoryMirror, NodeRecord, TopologyMirror};

/// Default maximum participant count
pub const DEFAULT_MAX_NODES: usize = 100;

/// Default maximum links per participant
pub const DEFAULT_MAX_EDGES_PER_NODE: usize = 10;
