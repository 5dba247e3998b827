//! A capability that forwards values through the graph.
//!
//! A node emits its configured `value` when it has one, otherwise the value
//! on its lowest-numbered connected input, on every output socket.

use async_trait::async_trait;
use nodeflow_core::hashing::hash_value;
use nodeflow_core::types::output_key;
use nodeflow_core::{GraphStore, NodeId, PortValues, SocketRole};
use nodeflow_exec::{CapabilityError, ExecutableCapability};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct NodeProgram {
    config: Value,
    outputs: Vec<u32>,
}

/// Capability built from a snapshot of the store's nodes
#[derive(Debug, Clone, Default)]
pub struct PassthroughCapability {
    programs: HashMap<NodeId, NodeProgram>,
}

impl PassthroughCapability {
    /// Snapshot every node's configuration and output sockets
    pub fn from_store(store: &GraphStore) -> Self {
        let programs = store
            .nodes()
            .map(|node| {
                let outputs = node
                    .sockets()
                    .iter()
                    .filter(|socket| socket.role == SocketRole::Output)
                    .map(|socket| socket.index)
                    .collect();
                (
                    node.id.clone(),
                    NodeProgram {
                        config: node.config.clone(),
                        outputs,
                    },
                )
            })
            .collect();
        Self { programs }
    }

    /// Number of nodes this capability can run
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether no node can be run
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

fn first_input(inputs: &PortValues) -> Option<&Value> {
    inputs
        .iter()
        .filter_map(|(key, value)| {
            let index: u32 = key.strip_prefix("input_")?.parse().ok()?;
            Some((index, value))
        })
        .min_by_key(|(index, _)| *index)
        .map(|(_, value)| value)
}

#[async_trait]
impl ExecutableCapability for PassthroughCapability {
    fn can_execute(&self, node: &NodeId) -> bool {
        self.programs.contains_key(node)
    }

    async fn execute(&self, node: &NodeId, inputs: &PortValues) -> Result<PortValues, CapabilityError> {
        let program = self
            .programs
            .get(node)
            .ok_or_else(|| CapabilityError::NotExecutable(node.to_string()))?;

        let value = program
            .config
            .get("value")
            .or_else(|| first_input(inputs))
            .cloned()
            .unwrap_or(Value::Null);

        Ok(program
            .outputs
            .iter()
            .map(|index| (output_key(*index), value.clone()))
            .collect())
    }

    fn execution_hash(&self, node: &NodeId) -> String {
        self.programs
            .get(node)
            .map(|program| hash_value(&program.config))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_core::{Node, NodeTypeRegistry, Point2D};
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> GraphStore {
        let mut store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        store
            .insert_node(
                Node::new(NodeId::from("src"), "SOURCE", 0, 1, Point2D::default()).unwrap().with_config(json!({"value": 42})),
            )
            .unwrap();
        store
            .insert_node(Node::new(NodeId::from("split"), "SPLIT", 1, 2, Point2D::default()).unwrap())
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_configured_value_wins() {
        let capability = PassthroughCapability::from_store(&store());
        let outputs = capability.execute(&NodeId::from("src"), &PortValues::new()).await.unwrap();
        assert_eq!(outputs["output_0"], json!(42));
    }

    #[tokio::test]
    async fn test_lowest_input_is_forwarded_to_every_output() {
        let capability = PassthroughCapability::from_store(&store());
        let mut inputs = PortValues::new();
        inputs.insert("input_3".to_string(), json!("late"));
        inputs.insert("input_0".to_string(), json!("early"));

        let outputs = capability.execute(&NodeId::from("split"), &inputs).await.unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs["output_1"], json!("early"));
        assert_eq!(outputs["output_2"], json!("early"));
    }

    #[test]
    fn test_unknown_node_is_not_executable() {
        let capability = PassthroughCapability::from_store(&store());
        assert!(!capability.can_execute(&NodeId::from("ghost")));
        assert_eq!(capability.len(), 2);
    }
}
