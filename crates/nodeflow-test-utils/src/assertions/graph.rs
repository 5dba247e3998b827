//! Assertion utilities for graph stores and execution orders.

use nodeflow_core::{GraphStore, NodeId, SocketRole};
use std::collections::HashMap;
use thiserror::Error;

/// Error type for graph assertion failures
#[derive(Debug, Error, PartialEq)]
pub enum GraphAssertionError {
    #[error("Store integrity violated: {0}")]
    Integrity(String),

    #[error("Edge {edge} has roles {from:?} -> {to:?}")]
    WrongRoles {
        edge: String,
        from: SocketRole,
        to: SocketRole,
    },

    #[error("Socket {0} is used by more than one edge")]
    SharedSocket(String),

    #[error("Node {0} missing from order")]
    MissingFromOrder(String),

    #[error("Expected {before} before {after}")]
    OutOfOrder { before: String, after: String },
}

/// Asserts the structural invariants of a store: integrity, edge roles and
/// at most one edge per socket.
pub fn assert_store_invariants(store: &GraphStore) -> Result<(), GraphAssertionError> {
    store
        .validate_integrity()
        .map_err(|e| GraphAssertionError::Integrity(e.to_string()))?;

    let mut usage: HashMap<String, usize> = HashMap::new();
    for edge in store.resolved_edges() {
        if let Some(resolved) = edge.resolution() {
            if resolved.from.role != SocketRole::Output || resolved.to.role != SocketRole::Input {
                return Err(GraphAssertionError::WrongRoles {
                    edge: edge.id.to_string(),
                    from: resolved.from.role,
                    to: resolved.to.role,
                });
            }
        }
        *usage.entry(edge.from.to_string()).or_default() += 1;
        *usage.entry(edge.to.to_string()).or_default() += 1;
    }

    match usage.into_iter().find(|(_, count)| *count > 1) {
        Some((socket, _)) => Err(GraphAssertionError::SharedSocket(socket)),
        None => Ok(()),
    }
}

/// Asserts that `before` appears earlier than `after` in `order`.
pub fn assert_precedes(order: &[NodeId], before: &NodeId, after: &NodeId) -> Result<(), GraphAssertionError> {
    let position = |node: &NodeId| {
        order
            .iter()
            .position(|n| n == node)
            .ok_or_else(|| GraphAssertionError::MissingFromOrder(node.to_string()))
    };

    if position(before)? < position(after)? {
        Ok(())
    } else {
        Err(GraphAssertionError::OutOfOrder {
            before: before.to_string(),
            after: after.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_precedes() {
        let order = vec![NodeId::from("a"), NodeId::from("b")];
        assert!(assert_precedes(&order, &NodeId::from("a"), &NodeId::from("b")).is_ok());
        assert_eq!(
            assert_precedes(&order, &NodeId::from("b"), &NodeId::from("a")),
            Err(GraphAssertionError::OutOfOrder {
                before: "b".to_string(),
                after: "a".to_string(),
            })
        );
        assert!(matches!(
            assert_precedes(&order, &NodeId::from("z"), &NodeId::from("a")),
            Err(GraphAssertionError::MissingFromOrder(_))
        ));
    }
}
