use thiserror::Error;

use crate::domain::ids::{EdgeId, NodeId, SocketIndex};
use crate::domain::socket::SocketRole;

/// Result alias used throughout the core crate
pub type CoreResult<T> = Result<T, CoreError>;

/// Reasons an edge cannot be bound to live sockets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// An endpoint names a node that is not in the store
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// An endpoint names a socket index the node does not have
    #[error("Socket index {index} out of range for node {node}")]
    SocketIndexOutOfRange {
        /// Owning node
        node: NodeId,
        /// Requested index
        index: SocketIndex,
    },

    /// The source is not an output or the target is not an input
    #[error("Socket {index} on node {node} has role {actual:?}, expected {expected:?}")]
    RoleMismatch {
        /// Owning node
        node: NodeId,
        /// Socket index
        index: SocketIndex,
        /// Role the edge needs at this end
        expected: SocketRole,
        /// Role the socket actually has
        actual: SocketRole,
    },

    /// The socket is already bound to another edge
    #[error("Socket {index} on node {node} is already connected to edge {existing}")]
    SocketAlreadyConnected {
        /// Owning node
        node: NodeId,
        /// Socket index
        index: SocketIndex,
        /// Edge currently holding the socket
        existing: EdgeId,
    },

    /// Both endpoints belong to the same node
    #[error("Self loops are not allowed on node {0}")]
    SelfLoopDisallowed(NodeId),

    /// The edge is already bound and must be unbound before resolving again
    #[error("Edge already resolved: {0}")]
    AlreadyResolved(EdgeId),
}

/// Core error type for graph operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Node type is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A node with this id already exists
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    /// An edge with this id already exists
    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(EdgeId),

    /// Socket counts exceed the per-node limit
    #[error("Node {node} declares too many sockets: {inputs} inputs and {outputs} outputs")]
    TooManySockets {
        /// Node being created
        node: NodeId,
        /// Requested input count
        inputs: u32,
        /// Requested output count
        outputs: u32,
    },

    /// Edge resolution failed
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// One or more store invariants do not hold
    #[error("Integrity violations: {}", .0.join("; "))]
    Integrity(Vec<String>),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
