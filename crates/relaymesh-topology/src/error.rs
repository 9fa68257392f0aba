//! Topology error types

use crate::graph::NodeId;
use thiserror::Error;

/// Topology-specific errors
///
/// A missing route is not an error: pathfinding reports it as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Self-loop edges are not allowed")]
    SelfLoop,

    #[error("Invalid edge weight: {0} (must be >= 1)")]
    InvalidWeight(u32),

    #[error("Node limit reached: {0}")]
    NodeLimitReached(usize),

    #[error("Connection limit reached for node {0}")]
    DegreeLimitReached(NodeId),

    #[error("Edge references missing node: {0}")]
    EdgeEndpointMissing(NodeId),

    #[error("Mirror error: {0}")]
    Mirror(String),
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;
