use tracing::debug;

use super::GraphStore;
use crate::domain::edge::{Edge, ResolvedEdge};
use crate::domain::events::GraphEvent;
use crate::domain::ids::EdgeId;
use crate::domain::socket::{SocketAddress, SocketRef, SocketRole};
use crate::error::{CoreError, CoreResult, ResolutionError};

impl GraphStore {
    /// Check whether an edge between `from` and `to` could be bound right now.
    ///
    /// Checks run in a fixed order and the first failure wins: both nodes
    /// exist, both socket indices exist, roles are output then input, neither
    /// socket is taken, and the owners differ.
    pub fn check_resolution(
        &self,
        from: &SocketAddress,
        to: &SocketAddress,
    ) -> Result<ResolvedEdge, ResolutionError> {
        let from_node = self
            .nodes
            .get(&from.node)
            .ok_or_else(|| ResolutionError::NodeNotFound(from.node.clone()))?;
        let to_node = self
            .nodes
            .get(&to.node)
            .ok_or_else(|| ResolutionError::NodeNotFound(to.node.clone()))?;

        let from_socket = from_node.socket(from.index).ok_or_else(|| {
            ResolutionError::SocketIndexOutOfRange {
                node: from.node.clone(),
                index: from.index,
            }
        })?;
        let to_socket =
            to_node
                .socket(to.index)
                .ok_or_else(|| ResolutionError::SocketIndexOutOfRange {
                    node: to.node.clone(),
                    index: to.index,
                })?;

        for (address, socket, expected) in [
            (from, from_socket, SocketRole::Output),
            (to, to_socket, SocketRole::Input),
        ] {
            if socket.role != expected {
                return Err(ResolutionError::RoleMismatch {
                    node: address.node.clone(),
                    index: address.index,
                    expected,
                    actual: socket.role,
                });
            }
        }

        for (address, socket) in [(from, from_socket), (to, to_socket)] {
            if let Some(existing) = &socket.connected_edge {
                return Err(ResolutionError::SocketAlreadyConnected {
                    node: address.node.clone(),
                    index: address.index,
                    existing: existing.clone(),
                });
            }
        }

        if from.node == to.node {
            return Err(ResolutionError::SelfLoopDisallowed(from.node.clone()));
        }

        Ok(ResolvedEdge {
            from: SocketRef {
                address: from.clone(),
                role: SocketRole::Output,
            },
            to: SocketRef {
                address: to.clone(),
                role: SocketRole::Input,
            },
        })
    }

    /// Bind a stored unresolved edge to its sockets.
    ///
    /// Resolving an edge that is already bound fails with
    /// [`ResolutionError::AlreadyResolved`]; call [`GraphStore::unresolve_edge`] first.
    pub fn resolve_edge(&mut self, id: &EdgeId) -> CoreResult<ResolvedEdge> {
        let edge = self
            .edges
            .get(id)
            .ok_or_else(|| CoreError::EdgeNotFound(id.clone()))?;
        if edge.is_resolved() {
            return Err(ResolutionError::AlreadyResolved(id.clone()).into());
        }

        let resolved = self.check_resolution(&edge.from, &edge.to)?;
        self.bind(id, &resolved);
        if let Some(edge) = self.edges.get_mut(id) {
            edge.resolution = Some(resolved.clone());
        }

        debug!(edge_id = %id, from = %resolved.from.address, to = %resolved.to.address, "Resolved edge");
        self.emit(GraphEvent::EdgeAdded {
            edge: id.clone(),
            from: resolved.from.address.clone(),
            to: resolved.to.address.clone(),
        });
        Ok(resolved)
    }

    /// Unbind a resolved edge but keep it in the store
    pub fn unresolve_edge(&mut self, id: &EdgeId) -> CoreResult<()> {
        let edge = self
            .edges
            .get_mut(id)
            .ok_or_else(|| CoreError::EdgeNotFound(id.clone()))?;
        if edge.resolution.take().is_none() {
            return Ok(());
        }

        let edge = edge.clone();
        self.unbind(&edge);
        self.emit(GraphEvent::EdgeRemoved {
            edge: edge.id,
            from: edge.from,
            to: edge.to,
        });
        Ok(())
    }

    /// Connect two live sockets with a new, already resolved edge.
    ///
    /// On failure nothing is inserted.
    pub fn connect(&mut self, from: SocketAddress, to: SocketAddress) -> CoreResult<EdgeId> {
        self.connect_with_id(EdgeId::new_v4(), from, to)
    }

    /// Like [`GraphStore::connect`] with a caller supplied edge id
    pub fn connect_with_id(
        &mut self,
        id: EdgeId,
        from: SocketAddress,
        to: SocketAddress,
    ) -> CoreResult<EdgeId> {
        if self.edges.contains_key(&id) {
            return Err(CoreError::DuplicateEdgeId(id));
        }

        let resolved = self.check_resolution(&from, &to)?;
        self.bind(&id, &resolved);

        let mut edge = Edge::new(id.clone(), from.clone(), to.clone());
        edge.resolution = Some(resolved);
        self.edges.insert(id.clone(), edge);

        debug!(edge_id = %id, from = %from, to = %to, "Connected sockets");
        self.emit(GraphEvent::EdgeAdded {
            edge: id.clone(),
            from,
            to,
        });
        Ok(id)
    }

    fn bind(&mut self, id: &EdgeId, resolved: &ResolvedEdge) {
        for end in [&resolved.from.address, &resolved.to.address] {
            if let Some(node) = self.nodes.get_mut(&end.node) {
                if let Some(socket) = node.socket_mut(end.index) {
                    socket.connected_edge = Some(id.clone());
                }
                node.attach_edge(id.clone());
            }
        }
    }

    pub(super) fn unbind(&mut self, edge: &Edge) {
        for end in [&edge.from, &edge.to] {
            if let Some(node) = self.nodes.get_mut(&end.node) {
                if let Some(socket) = node.socket_mut(end.index) {
                    if socket.connected_edge.as_ref() == Some(&edge.id) {
                        socket.connected_edge = None;
                    }
                }
                node.detach_edge(&edge.id);
            }
        }
    }
}
