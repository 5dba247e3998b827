use nodeflow_core::{EdgeId, GraphStore, NodeId};
use std::collections::HashSet;

use crate::description::GraphDescription;
use crate::validation::{error_codes, missing, socket_number, ValidationError, Validator};

/// Checks edge elements: required fields, socket indices, id uniqueness and node references
pub struct EdgeElementValidator {}

impl EdgeElementValidator {
    /// Create a new edge element validator
    pub fn new() -> Self {
        EdgeElementValidator {}
    }

    fn check_endpoint(
        &self,
        node: &Option<String>,
        index: Option<i64>,
        node_field: &str,
        index_field: &str,
        path: &str,
        described: &HashSet<&str>,
        store: &GraphStore,
        errors: &mut Vec<ValidationError>,
    ) {
        match node {
            None => errors.push(missing(node_field, path.to_string())),
            Some(node) => {
                if !described.contains(node.as_str()) && !store.contains_node(&NodeId::from(node.as_str())) {
                    errors.push(ValidationError {
                        code: error_codes::INVALID_REFERENCE,
                        message: format!("Edge references unknown node '{}'", node),
                        path: Some(format!("{}.{}", path, node_field)),
                    });
                }
            }
        }

        match index {
            None => errors.push(missing(index_field, path.to_string())),
            Some(index) => {
                if let Err(e) = socket_number(index, index_field, format!("{}.{}", path, index_field)) {
                    errors.push(e);
                }
            }
        }
    }
}

impl Default for EdgeElementValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for EdgeElementValidator {
    fn validate(&self, description: &GraphDescription, store: &GraphStore) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let described: HashSet<&str> = description
            .nodes
            .iter()
            .filter_map(|node| node.id.as_deref())
            .collect();
        let mut seen = HashSet::with_capacity(description.edges.len());

        for (i, element) in description.edges.iter().enumerate() {
            let path = format!("edges[{}]", i);

            match &element.id {
                None => errors.push(missing("id", path.clone())),
                Some(id) => {
                    if !seen.insert(id.as_str()) {
                        errors.push(ValidationError {
                            code: error_codes::DUPLICATE_ID,
                            message: format!("Duplicate edge ID: '{}'", id),
                            path: Some(format!("{}.id", path)),
                        });
                    } else if store.contains_edge(&EdgeId::from(id.as_str())) {
                        errors.push(ValidationError {
                            code: error_codes::ID_IN_USE,
                            message: format!("Edge ID '{}' already exists in the graph", id),
                            path: Some(format!("{}.id", path)),
                        });
                    }
                }
            }

            self.check_endpoint(
                &element.from_node,
                element.from_socket_index,
                "fromNode",
                "fromSocketIndex",
                &path,
                &described,
                store,
                &mut errors,
            );
            self.check_endpoint(
                &element.to_node,
                element.to_socket_index,
                "toNode",
                "toSocketIndex",
                &path,
                &described,
                store,
                &mut errors,
            );
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{EdgeElement, NodeElement};
    use nodeflow_core::{Node, NodeTypeRegistry, Point2D};
    use std::sync::Arc;

    fn edge(id: &str, from: &str, from_index: i64, to: &str, to_index: i64) -> EdgeElement {
        EdgeElement {
            id: Some(id.to_string()),
            from_node: Some(from.to_string()),
            from_socket_index: Some(from_index),
            to_node: Some(to.to_string()),
            to_socket_index: Some(to_index),
        }
    }

    fn node(id: &str) -> NodeElement {
        NodeElement {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_edges_may_reference_described_or_stored_nodes() {
        let mut store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        store
            .insert_node(Node::new(NodeId::from("stored"), "SINK", 1, 0, Point2D::default()).unwrap())
            .unwrap();
        let description = GraphDescription {
            nodes: vec![node("S")],
            edges: vec![edge("e1", "S", 0, "stored", 0)],
        };

        assert!(EdgeElementValidator::new().validate(&description, &store).is_empty());
    }

    #[test]
    fn test_edge_problems_are_collected() {
        let store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        let description = GraphDescription {
            nodes: vec![node("S"), node("T")],
            edges: vec![
                edge("e1", "S", 0, "ghost", 0),
                edge("e1", "S", -2, "T", 0),
                EdgeElement {
                    id: Some("e3".to_string()),
                    ..Default::default()
                },
            ],
        };

        let errors = EdgeElementValidator::new().validate(&description, &store);
        let summary: Vec<_> = errors
            .iter()
            .map(|e| (e.code, e.path.clone().unwrap_or_default()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (error_codes::INVALID_REFERENCE, "edges[0].toNode".to_string()),
                (error_codes::DUPLICATE_ID, "edges[1].id".to_string()),
                (error_codes::INVALID_VALUE, "edges[1].fromSocketIndex".to_string()),
                (error_codes::MISSING_REQUIRED_FIELD, "edges[2]".to_string()),
                (error_codes::MISSING_REQUIRED_FIELD, "edges[2]".to_string()),
                (error_codes::MISSING_REQUIRED_FIELD, "edges[2]".to_string()),
                (error_codes::MISSING_REQUIRED_FIELD, "edges[2]".to_string()),
            ]
        );
    }
}
