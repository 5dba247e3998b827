//! Observer that records every graph and execution event it receives.

use nodeflow_core::{GraphEvent, GraphObserver};
use nodeflow_exec::{ExecutionEvent, ExecutionObserver};
use parking_lot::Mutex;

/// Records events in arrival order for later inspection.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    graph_events: Mutex<Vec<GraphEvent>>,
    execution_events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph events received so far.
    pub fn graph_events(&self) -> Vec<GraphEvent> {
        self.graph_events.lock().clone()
    }

    /// Event type names of the graph events received so far.
    pub fn graph_event_types(&self) -> Vec<&'static str> {
        self.graph_events.lock().iter().map(GraphEvent::event_type).collect()
    }

    /// Execution events received so far.
    pub fn execution_events(&self) -> Vec<ExecutionEvent> {
        self.execution_events.lock().clone()
    }

    /// Event type names of the execution events received so far.
    pub fn execution_event_types(&self) -> Vec<&'static str> {
        self.execution_events
            .lock()
            .iter()
            .map(ExecutionEvent::event_type)
            .collect()
    }

    /// Forgets everything recorded.
    pub fn clear(&self) {
        self.graph_events.lock().clear();
        self.execution_events.lock().clear();
    }
}

impl GraphObserver for RecordingObserver {
    fn on_graph_event(&self, event: &GraphEvent) {
        self.graph_events.lock().push(event.clone());
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_execution_event(&self, event: &ExecutionEvent) {
        self.execution_events.lock().push(event.clone());
    }
}
