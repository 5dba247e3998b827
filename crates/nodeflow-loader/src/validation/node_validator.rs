use nodeflow_core::{GraphStore, NodeId, MAX_SOCKETS};
use std::collections::HashSet;

use crate::description::GraphDescription;
use crate::validation::{error_codes, missing, socket_number, ValidationError, Validator};

/// Checks node elements: required fields, known types, socket counts and id uniqueness
pub struct NodeElementValidator {}

impl NodeElementValidator {
    /// Create a new node element validator
    pub fn new() -> Self {
        NodeElementValidator {}
    }
}

impl Default for NodeElementValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for NodeElementValidator {
    fn validate(&self, description: &GraphDescription, store: &GraphStore) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::with_capacity(description.nodes.len());

        for (i, element) in description.nodes.iter().enumerate() {
            let path = format!("nodes[{}]", i);

            match &element.id {
                None => errors.push(missing("id", path.clone())),
                Some(id) => {
                    if !seen.insert(id.as_str()) {
                        errors.push(ValidationError {
                            code: error_codes::DUPLICATE_ID,
                            message: format!("Duplicate node ID: '{}'", id),
                            path: Some(format!("{}.id", path)),
                        });
                    } else if store.contains_node(&NodeId::from(id.as_str())) {
                        errors.push(ValidationError {
                            code: error_codes::ID_IN_USE,
                            message: format!("Node ID '{}' already exists in the graph", id),
                            path: Some(format!("{}.id", path)),
                        });
                    }
                }
            }

            match &element.kind {
                None => errors.push(missing("type", path.clone())),
                Some(kind) if !store.registry().contains(kind) => errors.push(ValidationError {
                    code: error_codes::UNKNOWN_NODE_TYPE,
                    message: format!("Unknown node type: '{}'", kind),
                    path: Some(format!("{}.type", path)),
                }),
                Some(_) => {}
            }

            let mut total = Some(0u32);
            for (field, value) in [("inputs", element.inputs), ("outputs", element.outputs)] {
                let field_path = format!("{}.{}", path, field);
                let count = match value {
                    None => {
                        errors.push(missing(field, path.clone()));
                        None
                    }
                    Some(count) => match socket_number(count, field, field_path.clone()) {
                        Ok(count) if count > MAX_SOCKETS => {
                            errors.push(too_many_sockets(
                                format!("Field '{}' exceeds the limit of {} sockets, got {}", field, MAX_SOCKETS, count),
                                field_path,
                            ));
                            None
                        }
                        Ok(count) => Some(count),
                        Err(e) => {
                            errors.push(e);
                            None
                        }
                    },
                };
                total = total.zip(count).map(|(sum, count)| sum + count);
            }

            if let Some(total) = total.filter(|total| *total > MAX_SOCKETS) {
                errors.push(too_many_sockets(
                    format!("Node declares {} sockets, the limit is {}", total, MAX_SOCKETS),
                    path,
                ));
            }
        }

        errors
    }
}

fn too_many_sockets(message: String, path: String) -> ValidationError {
    ValidationError {
        code: error_codes::INVALID_VALUE,
        message,
        path: Some(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::NodeElement;
    use nodeflow_core::{Node, NodeTypeRegistry, Point2D};
    use std::sync::Arc;

    fn element(id: &str, kind: &str, inputs: i64, outputs: i64) -> NodeElement {
        NodeElement {
            id: Some(id.to_string()),
            kind: Some(kind.to_string()),
            inputs: Some(inputs),
            outputs: Some(outputs),
            ..Default::default()
        }
    }

    fn codes(errors: &[ValidationError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_valid_nodes_pass() {
        let store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        let description = GraphDescription {
            nodes: vec![element("a", "SOURCE", 0, 1), element("b", "SINK", 1, 0)],
            edges: vec![],
        };

        assert!(NodeElementValidator::new().validate(&description, &store).is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported_per_field() {
        let store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        let description = GraphDescription {
            nodes: vec![NodeElement::default()],
            edges: vec![],
        };

        let errors = NodeElementValidator::new().validate(&description, &store);

        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.code == error_codes::MISSING_REQUIRED_FIELD));
        assert_eq!(errors[0].path.as_deref(), Some("nodes[0]"));
    }

    #[test]
    fn test_unknown_type_duplicate_and_negative_count() {
        let mut store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        store
            .insert_node(Node::new(NodeId::from("existing"), "SOURCE", 0, 1, Point2D::default()).unwrap())
            .unwrap();
        let description = GraphDescription {
            nodes: vec![
                element("a", "BLUR", 1, 1),
                element("a", "SOURCE", 0, 1),
                element("existing", "SINK", 1, 0),
                element("c", "SINK", -1, 0),
            ],
            edges: vec![],
        };

        let errors = NodeElementValidator::new().validate(&description, &store);

        assert_eq!(
            codes(&errors),
            vec![
                error_codes::UNKNOWN_NODE_TYPE,
                error_codes::DUPLICATE_ID,
                error_codes::ID_IN_USE,
                error_codes::INVALID_VALUE,
            ]
        );
    }

    #[test]
    fn test_socket_counts_above_limit_are_rejected() {
        let store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        let description = GraphDescription {
            nodes: vec![
                element("huge", "SOURCE", u32::MAX as i64, 1),
                element("split", "MERGE", MAX_SOCKETS as i64, MAX_SOCKETS as i64),
                element("fits", "MERGE", MAX_SOCKETS as i64 - 1, 1),
            ],
            edges: vec![],
        };

        let errors = NodeElementValidator::new().validate(&description, &store);

        assert_eq!(codes(&errors), vec![error_codes::INVALID_VALUE, error_codes::INVALID_VALUE]);
        assert_eq!(errors[0].path.as_deref(), Some("nodes[0].inputs"));
        assert_eq!(errors[1].path.as_deref(), Some("nodes[1]"));
    }
}
