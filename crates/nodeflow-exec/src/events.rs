use nodeflow_core::NodeId;
use serde::Serialize;

use crate::result::{ExecutionReport, ExecutionResult};

/// Notification emitted while executing nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExecutionEvent {
    /// The capability was invoked for a node
    Started {
        /// Node being executed
        node: NodeId,
    },

    /// A node produced a successful result, from the capability or the cache
    Completed {
        /// Executed node
        node: NodeId,
        /// Its result
        result: ExecutionResult,
        /// Whether the result came from the memoization cache
        cached: bool,
    },

    /// A node failed
    Failed {
        /// Executed node
        node: NodeId,
        /// Failure description
        error: String,
    },

    /// An ordered batch finished
    BatchCompleted {
        /// Batch summary
        report: ExecutionReport,
    },
}

impl ExecutionEvent {
    /// Returns the type of the event as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ExecutionEvent::Started { .. } => "execution.started",
            ExecutionEvent::Completed { .. } => "execution.completed",
            ExecutionEvent::Failed { .. } => "execution.failed",
            ExecutionEvent::BatchCompleted { .. } => "execution.batch_completed",
        }
    }
}

/// Receives execution notifications
pub trait ExecutionObserver: Send + Sync {
    /// Called once per event, in emission order
    fn on_execution_event(&self, event: &ExecutionEvent);
}
