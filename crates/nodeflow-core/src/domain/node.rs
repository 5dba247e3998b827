use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::domain::ids::{EdgeId, NodeId, SocketIndex};
use crate::domain::socket::{Socket, SocketRole};
use crate::error::{CoreError, CoreResult};

/// Upper bound on the number of sockets a node may carry
pub const MAX_SOCKETS: u32 = 4096;

/// Position of a node on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point2D {
    /// Create a point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Aggregate: a typed unit of computation with a fixed set of sockets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// Registered type tag
    pub kind: String,

    /// Sockets in index order
    sockets: Vec<Socket>,

    /// Opaque configuration consumed by the executable capability
    pub config: Value,

    /// Canvas position
    pub position: Point2D,

    /// Resolved edges touching this node
    incident_edges: BTreeSet<EdgeId>,
}

impl Node {
    /// Create a node whose sockets are laid out inputs first, then outputs.
    ///
    /// Fails with [`CoreError::TooManySockets`] when `inputs + outputs`
    /// exceeds [`MAX_SOCKETS`].
    pub fn new(
        id: NodeId,
        kind: impl Into<String>,
        inputs: u32,
        outputs: u32,
        position: Point2D,
    ) -> CoreResult<Self> {
        match inputs.checked_add(outputs) {
            Some(total) if total <= MAX_SOCKETS => {}
            _ => return Err(CoreError::TooManySockets { node: id, inputs, outputs }),
        }

        let sockets = (0..inputs)
            .map(|i| Socket::new(id.clone(), i, SocketRole::Input))
            .chain((0..outputs).map(|o| Socket::new(id.clone(), inputs + o, SocketRole::Output)))
            .collect();

        Ok(Self {
            id,
            kind: kind.into(),
            sockets,
            config: Value::Null,
            position,
            incident_edges: BTreeSet::new(),
        })
    }

    /// Set the configuration
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// All sockets in index order
    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    /// Look up a socket by index
    pub fn socket(&self, index: SocketIndex) -> Option<&Socket> {
        self.sockets.get(index as usize)
    }

    pub(crate) fn socket_mut(&mut self, index: SocketIndex) -> Option<&mut Socket> {
        self.sockets.get_mut(index as usize)
    }

    /// Number of input sockets
    pub fn input_count(&self) -> u32 {
        self.sockets.iter().filter(|s| s.role == SocketRole::Input).count() as u32
    }

    /// Number of output sockets
    pub fn output_count(&self) -> u32 {
        self.sockets.iter().filter(|s| s.role == SocketRole::Output).count() as u32
    }

    /// Resolved edges touching this node
    pub fn incident_edges(&self) -> &BTreeSet<EdgeId> {
        &self.incident_edges
    }

    pub(crate) fn attach_edge(&mut self, edge: EdgeId) {
        self.incident_edges.insert(edge);
    }

    pub(crate) fn detach_edge(&mut self, edge: &EdgeId) {
        self.incident_edges.remove(edge);
    }

    pub(crate) fn reset_bindings(&mut self) {
        for socket in &mut self.sockets {
            socket.connected_edge = None;
        }
        self.incident_edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_layout_is_inputs_then_outputs() {
        let node = Node::new(NodeId::from("m"), "MERGE", 2, 1, Point2D::default()).unwrap();

        let roles: Vec<_> = node.sockets().iter().map(|s| (s.index, s.role)).collect();
        assert_eq!(
            roles,
            vec![
                (0, SocketRole::Input),
                (1, SocketRole::Input),
                (2, SocketRole::Output),
            ]
        );
        assert!(node.sockets().iter().all(|s| s.owner == node.id));
        assert_eq!(node.input_count(), 2);
        assert_eq!(node.output_count(), 1);
        assert!(node.socket(3).is_none());
    }

    #[test]
    fn test_source_node_has_only_outputs() {
        let node = Node::new(NodeId::from("s"), "SOURCE", 0, 1, Point2D::new(10.0, 20.0)).unwrap();
        assert_eq!(node.socket(0).map(|s| s.role), Some(SocketRole::Output));
        assert!(node.incident_edges().is_empty());
    }

    #[test]
    fn test_oversized_socket_layout_is_rejected() {
        let err = Node::new(NodeId::from("big"), "SOURCE", u32::MAX, 1, Point2D::default()).unwrap_err();
        assert!(matches!(err, CoreError::TooManySockets { inputs: u32::MAX, outputs: 1, .. }));

        assert!(Node::new(NodeId::from("wide"), "MERGE", MAX_SOCKETS + 1, 0, Point2D::default()).is_err());
        assert!(Node::new(NodeId::from("edge"), "MERGE", MAX_SOCKETS - 1, 1, Point2D::default()).is_ok());
    }
}
