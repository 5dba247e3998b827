use async_trait::async_trait;
use nodeflow_core::{NodeId, PortValues};

use crate::error::CapabilityError;

/// External collaborator that performs a node's computation.
///
/// `execution_hash` must change whenever, and only when, the node's
/// computation-relevant configuration changes. Memoized results are keyed
/// on it.
#[async_trait]
pub trait ExecutableCapability: Send + Sync {
    /// Whether the node has something to run
    fn can_execute(&self, node: &NodeId) -> bool;

    /// Run the node on `inputs` and return its outputs
    async fn execute(&self, node: &NodeId, inputs: &PortValues) -> Result<PortValues, CapabilityError>;

    /// Content hash of the node's executable configuration
    fn execution_hash(&self, node: &NodeId) -> String;

    /// Extra upstream dependencies beyond the graph's edges
    fn dependencies(&self, _node: &NodeId) -> Vec<NodeId> {
        Vec::new()
    }
}

/// Capability that executes nothing. Used until a real one is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCapability;

#[async_trait]
impl ExecutableCapability for NoopCapability {
    fn can_execute(&self, _node: &NodeId) -> bool {
        false
    }

    async fn execute(&self, node: &NodeId, _inputs: &PortValues) -> Result<PortValues, CapabilityError> {
        Err(CapabilityError::NotExecutable(node.to_string()))
    }

    fn execution_hash(&self, _node: &NodeId) -> String {
        String::new()
    }
}
