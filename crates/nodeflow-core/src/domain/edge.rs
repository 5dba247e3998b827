use serde::{Deserialize, Serialize};

use crate::domain::ids::{EdgeId, NodeId};
use crate::domain::socket::{SocketAddress, SocketRef};

/// Live binding of an edge to the sockets at both ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEdge {
    /// Output socket at the source end
    pub from: SocketRef,
    /// Input socket at the target end
    pub to: SocketRef,
}

/// A directed connection from an output socket to an input socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,

    /// Source endpoint
    pub from: SocketAddress,

    /// Target endpoint
    pub to: SocketAddress,

    /// Binding set once the edge has been resolved against the store
    pub(crate) resolution: Option<ResolvedEdge>,
}

impl Edge {
    /// Create an unresolved edge
    pub fn new(id: EdgeId, from: SocketAddress, to: SocketAddress) -> Self {
        Self {
            id,
            from,
            to,
            resolution: None,
        }
    }

    /// Whether the edge is bound to live sockets
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// The binding, if resolved
    pub fn resolution(&self) -> Option<&ResolvedEdge> {
        self.resolution.as_ref()
    }

    /// Whether either endpoint belongs to `node`
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.from.node == node || &self.to.node == node
    }
}
