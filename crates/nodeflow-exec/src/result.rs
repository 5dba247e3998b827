use chrono::{DateTime, Utc};
use nodeflow_core::{NodeId, PortValues};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution state of a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeExecutionState {
    /// No current result
    NotExecuted,
    /// The capability is running
    Executing,
    /// Last run succeeded
    Completed,
    /// Last run failed
    Failed,
}

/// Outcome of running one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Values produced, keyed `output_<socket index>`
    pub outputs: PortValues,

    /// Whether the run succeeded
    pub success: bool,

    /// Failure description
    pub error: Option<String>,

    /// Execution hash of the node's configuration at run time
    pub content_hash: String,

    /// Wall-clock time spent in the capability
    pub duration: Duration,

    /// When the run finished
    pub executed_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// A successful result
    pub fn success(outputs: PortValues, content_hash: String, duration: Duration) -> Self {
        Self {
            outputs,
            success: true,
            error: None,
            content_hash,
            duration,
            executed_at: Utc::now(),
        }
    }

    /// A failed result
    pub fn failure(error: impl Into<String>, content_hash: String, duration: Duration) -> Self {
        Self {
            outputs: PortValues::new(),
            success: false,
            error: Some(error.into()),
            content_hash,
            duration,
            executed_at: Utc::now(),
        }
    }
}

/// Aggregate execution counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Capability invocations, successful or not
    pub total_executions: u64,
    /// Results served from the memoization cache
    pub cache_hits: u64,
    /// Time spent inside the capability
    pub total_duration: Duration,
    /// Invocations that failed, panicked or timed out
    pub failed_executions: u64,
}

/// Summary of one ordered batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Nodes run, in execution order
    pub executed: Vec<NodeId>,
    /// Nodes whose result was a failure
    pub failed: Vec<NodeId>,
    /// Nodes answered from the cache
    pub cache_hits: Vec<NodeId>,
    /// Requested nodes left out because they sit on a cycle
    pub cyclic: Vec<NodeId>,
}

impl ExecutionReport {
    /// Whether every executed node succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
