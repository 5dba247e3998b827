//! Scriptable in-memory implementation of the ExecutableCapability trait.

use async_trait::async_trait;
use nodeflow_core::hashing::hash_value;
use nodeflow_core::types::output_key;
use nodeflow_core::{GraphStore, NodeId, PortValues, SocketRole};
use nodeflow_exec::{CapabilityError, ExecutableCapability};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Output sockets written for nodes without a declared layout
const FALLBACK_OUTPUTS: u32 = 8;

/// What a scripted node does when executed
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Emit `config.value` plus the sum of all numeric inputs
    Sum,
    /// Emit a fixed value
    Constant(Value),
    /// Return a capability error with this message
    Fail(String),
    /// Panic with this message
    Panic(String),
    /// Sleep, then behave like [`Behavior::Sum`]
    Sleep(Duration),
    /// Report the node as not executable
    NotExecutable,
}

#[derive(Debug, Clone)]
struct NodeScript {
    config: Value,
    behavior: Behavior,
    outputs: Option<Vec<u32>>,
    dependencies: Vec<NodeId>,
}

impl Default for NodeScript {
    fn default() -> Self {
        Self {
            config: Value::Null,
            behavior: Behavior::Sum,
            outputs: None,
            dependencies: Vec::new(),
        }
    }
}

/// Thread-safe scripted capability for testing.
///
/// Unscripted nodes are executable, behave like [`Behavior::Sum`] with a
/// null configuration and write their value to output sockets 0 through 7.
/// The execution hash is the content hash of the node's scripted configuration.
#[derive(Clone, Default)]
pub struct ScriptedCapability {
    scripts: Arc<RwLock<HashMap<NodeId, NodeScript>>>,
    invocations: Arc<Mutex<HashMap<NodeId, usize>>>,
    log: Arc<Mutex<Vec<NodeId>>>,
}

impl fmt::Debug for ScriptedCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedCapability")
            .field("scripted_nodes", &self.scripts.read().len())
            .field("invocations", &self.total_invocations())
            .finish()
    }
}

impl ScriptedCapability {
    /// Creates a capability with no scripted nodes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capability scripted from the store: every node gets its
    /// configuration and its real output socket layout.
    pub fn from_store(store: &GraphStore) -> Self {
        let capability = Self::new();
        {
            let mut scripts = capability.scripts.write();
            for node in store.nodes() {
                let outputs = node
                    .sockets()
                    .iter()
                    .filter(|socket| socket.role == SocketRole::Output)
                    .map(|socket| socket.index)
                    .collect();
                scripts.insert(
                    node.id.clone(),
                    NodeScript {
                        config: node.config.clone(),
                        outputs: Some(outputs),
                        ..NodeScript::default()
                    },
                );
            }
        }
        capability
    }

    /// Sets a node's configuration, changing its execution hash.
    pub fn set_config(&self, node: &NodeId, config: Value) {
        self.scripts.write().entry(node.clone()).or_default().config = config;
    }

    /// Sets what a node does when executed.
    pub fn set_behavior(&self, node: &NodeId, behavior: Behavior) {
        self.scripts.write().entry(node.clone()).or_default().behavior = behavior;
    }

    /// Sets the output socket indices a node writes to.
    pub fn set_outputs(&self, node: &NodeId, outputs: Vec<u32>) {
        self.scripts.write().entry(node.clone()).or_default().outputs = Some(outputs);
    }

    /// Declares an extra upstream dependency for a node.
    pub fn add_dependency(&self, node: &NodeId, upstream: &NodeId) {
        self.scripts
            .write()
            .entry(node.clone())
            .or_default()
            .dependencies
            .push(upstream.clone());
    }

    /// Number of times a node was executed.
    pub fn invocations(&self, node: &NodeId) -> usize {
        self.invocations.lock().get(node).copied().unwrap_or(0)
    }

    /// Number of executions across all nodes.
    pub fn total_invocations(&self) -> usize {
        self.invocations.lock().values().sum()
    }

    /// Nodes in the order they were executed.
    pub fn execution_log(&self) -> Vec<NodeId> {
        self.log.lock().clone()
    }

    /// Clears invocation counters and the execution log.
    pub fn reset_counters(&self) {
        self.invocations.lock().clear();
        self.log.lock().clear();
    }

    fn script(&self, node: &NodeId) -> NodeScript {
        self.scripts.read().get(node).cloned().unwrap_or_default()
    }
}

fn sum(config: &Value, inputs: &PortValues) -> Value {
    let base = config.get("value").and_then(Value::as_f64).unwrap_or(0.0);
    let total = inputs.values().filter_map(Value::as_f64).fold(base, |acc, v| acc + v);
    json!(total)
}

fn emit(outputs: Option<&[u32]>, value: Value) -> PortValues {
    let indices: Vec<u32> = match outputs {
        Some(indices) => indices.to_vec(),
        None => (0..FALLBACK_OUTPUTS).collect(),
    };
    indices
        .into_iter()
        .map(|index| (output_key(index), value.clone()))
        .collect()
}

#[async_trait]
impl ExecutableCapability for ScriptedCapability {
    fn can_execute(&self, node: &NodeId) -> bool {
        self.script(node).behavior != Behavior::NotExecutable
    }

    async fn execute(&self, node: &NodeId, inputs: &PortValues) -> Result<PortValues, CapabilityError> {
        *self.invocations.lock().entry(node.clone()).or_default() += 1;
        self.log.lock().push(node.clone());

        let script = self.script(node);
        match script.behavior {
            Behavior::Sum => Ok(emit(script.outputs.as_deref(), sum(&script.config, inputs))),
            Behavior::Constant(value) => Ok(emit(script.outputs.as_deref(), value)),
            Behavior::Fail(message) => Err(CapabilityError::ExecutionFailed(message)),
            Behavior::Panic(message) => panic!("{}", message),
            Behavior::Sleep(delay) => {
                tokio::time::sleep(delay).await;
                Ok(emit(script.outputs.as_deref(), sum(&script.config, inputs)))
            }
            Behavior::NotExecutable => Err(CapabilityError::NotExecutable(node.to_string())),
        }
    }

    fn execution_hash(&self, node: &NodeId) -> String {
        hash_value(&self.script(node).config)
    }

    fn dependencies(&self, node: &NodeId) -> Vec<NodeId> {
        self.script(node).dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_sum_adds_inputs_to_configured_value() {
        let capability = ScriptedCapability::new();
        let node = NodeId::from("n");
        capability.set_config(&node, json!({"value": 2}));
        capability.set_outputs(&node, vec![1]);

        let mut inputs = PortValues::new();
        inputs.insert("input_0".to_string(), json!(3));
        let outputs = capability.execute(&node, &inputs).await.unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs["output_1"], json!(5.0));
        assert_eq!(capability.invocations(&node), 1);
    }

    #[test]
    fn test_hash_follows_config_only() {
        let capability = ScriptedCapability::new();
        let node = NodeId::from("n");
        let before = capability.execution_hash(&node);

        capability.set_behavior(&node, Behavior::Constant(json!(1)));
        assert_eq!(capability.execution_hash(&node), before);

        capability.set_config(&node, json!({"value": 1}));
        assert_ne!(capability.execution_hash(&node), before);
    }

    #[tokio::test]
    async fn test_fail_and_not_executable() {
        let capability = ScriptedCapability::new();
        let node = NodeId::from("n");

        capability.set_behavior(&node, Behavior::Fail("boom".to_string()));
        let err = capability.execute(&node, &PortValues::new()).await.unwrap_err();
        assert_eq!(err, CapabilityError::ExecutionFailed("boom".to_string()));

        capability.set_behavior(&node, Behavior::NotExecutable);
        assert!(!capability.can_execute(&node));
    }
}
