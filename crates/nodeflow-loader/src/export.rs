use nodeflow_core::GraphStore;

use crate::description::{EdgeElement, GraphDescription, NodeElement};

/// Describe the current store contents.
///
/// Nodes and edges are emitted in id order. Unresolved edges are included,
/// so loading the result into an empty store reproduces the same topology.
pub fn export_description(store: &GraphStore) -> GraphDescription {
    let nodes = store
        .node_ids()
        .iter()
        .filter_map(|id| store.node(id))
        .map(|node| NodeElement {
            id: Some(node.id.to_string()),
            kind: Some(node.kind.clone()),
            x: Some(node.position.x),
            y: Some(node.position.y),
            inputs: Some(i64::from(node.input_count())),
            outputs: Some(i64::from(node.output_count())),
            config: node.config.clone(),
        })
        .collect();

    let edges = store
        .edge_ids()
        .iter()
        .filter_map(|id| store.edge(id))
        .map(|edge| EdgeElement {
            id: Some(edge.id.to_string()),
            from_node: Some(edge.from.node.to_string()),
            from_socket_index: Some(i64::from(edge.from.index)),
            to_node: Some(edge.to.node.to_string()),
            to_socket_index: Some(i64::from(edge.to.index)),
        })
        .collect();

    GraphDescription { nodes, edges }
}
