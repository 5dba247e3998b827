use nodeflow_core::{Edge, EdgeId, SocketAddress};
use std::collections::HashMap;

use crate::error::LoadError;

/// Find the first socket claimed by two edges, as source or target.
///
/// Edges are scanned in order, so `first_edge` of the returned conflict is
/// always the earlier one.
pub fn detect_socket_conflicts(edges: &[Edge]) -> Result<(), LoadError> {
    let mut claimed: HashMap<&SocketAddress, &EdgeId> = HashMap::with_capacity(edges.len() * 2);

    for edge in edges {
        for end in [&edge.from, &edge.to] {
            if let Some(first) = claimed.insert(end, &edge.id) {
                return Err(LoadError::SocketConflict {
                    node: end.node.clone(),
                    socket: end.index,
                    first_edge: first.clone(),
                    second_edge: edge.id.clone(),
                });
            }
        }
    }

    Ok(())
}
