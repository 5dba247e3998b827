use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ids::{EdgeId, NodeId, SocketIndex};

/// Direction of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketRole {
    /// Receives data from an upstream output
    Input,
    /// Provides data to downstream inputs
    Output,
}

/// A typed connection point owned by exactly one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    /// Input or output
    pub role: SocketRole,

    /// Stable index within the owning node
    pub index: SocketIndex,

    /// Owning node
    pub owner: NodeId,

    /// Edge bound to this socket, if any
    pub connected_edge: Option<EdgeId>,
}

impl Socket {
    /// Create an unconnected socket
    pub fn new(owner: NodeId, index: SocketIndex, role: SocketRole) -> Self {
        Self {
            role,
            index,
            owner,
            connected_edge: None,
        }
    }

    /// Whether an edge is bound to this socket
    pub fn is_connected(&self) -> bool {
        self.connected_edge.is_some()
    }
}

/// Durable reference to a socket by owning node and index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketAddress {
    /// Owning node
    pub node: NodeId,
    /// Socket index within the node
    pub index: SocketIndex,
}

impl SocketAddress {
    /// Build an address
    pub fn new(node: impl Into<NodeId>, index: SocketIndex) -> Self {
        Self {
            node: node.into(),
            index,
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node, self.index)
    }
}

/// A socket address checked against the live store, with its role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    /// Address of the socket
    pub address: SocketAddress,
    /// Role found at resolution time
    pub role: SocketRole,
}
