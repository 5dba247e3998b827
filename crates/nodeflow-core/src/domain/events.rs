use serde::{Deserialize, Serialize};

use crate::domain::ids::{EdgeId, NodeId};
use crate::domain::node::Point2D;
use crate::domain::socket::SocketAddress;

/// Change notification produced by the graph store.
///
/// Edge events describe topology: `EdgeAdded` fires when an edge becomes
/// bound to live sockets, and `EdgeRemoved` fires when a bound edge goes away.
/// Removal carries the former endpoints so observers can still work out what
/// sat downstream of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphEvent {
    /// A node was inserted
    NodeAdded {
        /// New node
        node: NodeId,
    },

    /// A node was removed after its incident edges
    NodeRemoved {
        /// Removed node
        node: NodeId,
    },

    /// A node changed position
    NodeMoved {
        /// Moved node
        node: NodeId,
        /// Previous position
        old: Point2D,
        /// New position
        new: Point2D,
    },

    /// A node's configuration was replaced
    NodeConfigChanged {
        /// Reconfigured node
        node: NodeId,
    },

    /// An edge was bound between two sockets
    EdgeAdded {
        /// New edge
        edge: EdgeId,
        /// Source socket
        from: SocketAddress,
        /// Target socket
        to: SocketAddress,
    },

    /// A bound edge was removed
    EdgeRemoved {
        /// Removed edge
        edge: EdgeId,
        /// Former source socket
        from: SocketAddress,
        /// Former target socket
        to: SocketAddress,
    },

    /// Every node and edge was removed
    GraphCleared,

    /// Observers should defer their reaction until the matching `BatchEnd`
    BatchBegin,

    /// End of a deferred batch
    BatchEnd,
}

impl GraphEvent {
    /// Returns the type of the event as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            GraphEvent::NodeAdded { .. } => "graph.node_added",
            GraphEvent::NodeRemoved { .. } => "graph.node_removed",
            GraphEvent::NodeMoved { .. } => "graph.node_moved",
            GraphEvent::NodeConfigChanged { .. } => "graph.node_config_changed",
            GraphEvent::EdgeAdded { .. } => "graph.edge_added",
            GraphEvent::EdgeRemoved { .. } => "graph.edge_removed",
            GraphEvent::GraphCleared => "graph.cleared",
            GraphEvent::BatchBegin => "graph.batch_begin",
            GraphEvent::BatchEnd => "graph.batch_end",
        }
    }

    /// Whether this event changes the dependency structure of the graph
    pub fn affects_topology(&self) -> bool {
        matches!(
            self,
            GraphEvent::NodeAdded { .. }
                | GraphEvent::NodeRemoved { .. }
                | GraphEvent::EdgeAdded { .. }
                | GraphEvent::EdgeRemoved { .. }
                | GraphEvent::GraphCleared
        )
    }
}

/// Receives graph change notifications
pub trait GraphObserver: Send + Sync {
    /// Called once per event, in emission order
    fn on_graph_event(&self, event: &GraphEvent);
}
