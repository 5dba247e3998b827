use super::GraphStore;
use crate::domain::socket::SocketRole;
use crate::error::{CoreError, CoreResult};

impl GraphStore {
    /// Verify every structural invariant of the store.
    ///
    /// Returns [`CoreError::Integrity`] listing each violation found.
    pub fn validate_integrity(&self) -> CoreResult<()> {
        let mut violations = Vec::new();

        for (id, node) in &self.nodes {
            for (position, socket) in node.sockets().iter().enumerate() {
                if socket.index as usize != position {
                    violations.push(format!("node {} socket at {} has index {}", id, position, socket.index));
                }
                if &socket.owner != id {
                    violations.push(format!("node {} socket {} is owned by {}", id, socket.index, socket.owner));
                }
                if let Some(edge_id) = &socket.connected_edge {
                    let bound_here = self.edges.get(edge_id).map_or(false, |edge| {
                        edge.is_resolved()
                            && ((&edge.from.node == id && edge.from.index == socket.index)
                                || (&edge.to.node == id && edge.to.index == socket.index))
                    });
                    if !bound_here {
                        violations.push(format!(
                            "node {} socket {} points at edge {} which is not bound to it",
                            id, socket.index, edge_id
                        ));
                    }
                }
            }

            for edge_id in node.incident_edges() {
                let touches = self
                    .edges
                    .get(edge_id)
                    .map_or(false, |edge| edge.is_resolved() && edge.touches(id));
                if !touches {
                    violations.push(format!("node {} lists incident edge {} which does not touch it", id, edge_id));
                }
            }
        }

        for (id, edge) in &self.edges {
            for end in [&edge.from, &edge.to] {
                if !self.nodes.contains_key(&end.node) {
                    violations.push(format!("edge {} references missing node {}", id, end.node));
                }
            }

            if !edge.is_resolved() {
                continue;
            }
            if edge.from.node == edge.to.node {
                violations.push(format!("edge {} is a self loop on {}", id, edge.from.node));
            }
            for (end, expected) in [(&edge.from, SocketRole::Output), (&edge.to, SocketRole::Input)] {
                let Some(node) = self.nodes.get(&end.node) else {
                    continue;
                };
                match node.socket(end.index) {
                    Some(socket) => {
                        if socket.role != expected {
                            violations.push(format!("edge {} end {} has role {:?}", id, end, socket.role));
                        }
                        if socket.connected_edge.as_ref() != Some(id) {
                            violations.push(format!("edge {} end {} is not marked connected", id, end));
                        }
                    }
                    None => violations.push(format!("edge {} end {} is out of range", id, end)),
                }
                if !node.incident_edges().contains(id) {
                    violations.push(format!("edge {} missing from incidence of {}", id, end.node));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            violations.sort();
            Err(CoreError::Integrity(violations))
        }
    }
}
