//! Generators for graph descriptions.

use nodeflow_loader::{EdgeElement, GraphDescription, NodeElement};
use serde_json::Value;

/// Fluent builder for [`GraphDescription`] values.
#[derive(Debug, Clone, Default)]
pub struct DescriptionBuilder {
    description: GraphDescription,
}

impl DescriptionBuilder {
    /// Starts an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node element with explicit socket counts.
    pub fn node(self, id: &str, kind: &str, inputs: i64, outputs: i64) -> Self {
        self.node_with_config(id, kind, inputs, outputs, Value::Null)
    }

    /// Adds a node element carrying a configuration.
    pub fn node_with_config(mut self, id: &str, kind: &str, inputs: i64, outputs: i64, config: Value) -> Self {
        let offset = self.description.nodes.len() as f64 * 150.0;
        self.description.nodes.push(NodeElement {
            id: Some(id.to_string()),
            kind: Some(kind.to_string()),
            x: Some(offset),
            y: Some(0.0),
            inputs: Some(inputs),
            outputs: Some(outputs),
            config,
        });
        self
    }

    /// Adds an edge element from `from[from_index]` to `to[to_index]`.
    pub fn edge(mut self, id: &str, from: &str, from_index: i64, to: &str, to_index: i64) -> Self {
        self.description.edges.push(EdgeElement {
            id: Some(id.to_string()),
            from_node: Some(from.to_string()),
            from_socket_index: Some(from_index),
            to_node: Some(to.to_string()),
            to_socket_index: Some(to_index),
        });
        self
    }

    /// Adds a raw node element, for example one with missing fields.
    pub fn raw_node(mut self, element: NodeElement) -> Self {
        self.description.nodes.push(element);
        self
    }

    /// Adds a raw edge element.
    pub fn raw_edge(mut self, element: EdgeElement) -> Self {
        self.description.edges.push(element);
        self
    }

    /// Finishes the description.
    pub fn build(self) -> GraphDescription {
        self.description
    }
}

/// Creates a chain of `TRANSFORM` nodes `n0 -> n1 -> ... -> n{len-1}`.
///
/// Each node has one input (socket 0) and one output (socket 1); edge `e{i}`
/// connects `n{i}` to `n{i+1}`.
pub fn create_chain_description(len: usize) -> GraphDescription {
    let mut builder = DescriptionBuilder::new();
    for i in 0..len {
        builder = builder.node(&format!("n{}", i), "TRANSFORM", 1, 1);
    }
    for i in 1..len {
        builder = builder.edge(&format!("e{}", i - 1), &format!("n{}", i - 1), 1, &format!("n{}", i), 0);
    }
    builder.build()
}

/// Creates the source/sink pair `S -> T` as YAML.
pub fn create_source_sink_yaml() -> String {
    r#"
nodes:
  - id: S
    type: SOURCE
    x: 0
    y: 0
    inputs: 0
    outputs: 1
  - id: T
    type: SINK
    x: 200
    y: 0
    inputs: 1
    outputs: 0
edges:
  - id: s-to-t
    fromNode: S
    fromSocketIndex: 0
    toNode: T
    toSocketIndex: 0
"#
    .to_string()
}
