//! Dependency-ordered, memoized node execution.
//!
//! The orchestrator keeps the derived dependency graph, the current result
//! of every node, and the memoization cache. It reacts to graph change
//! notifications by invalidating exactly the results a change can affect
//! and by scheduling the changed node for re-execution.

use futures::FutureExt;
use nodeflow_core::hashing::hash_inputs;
use nodeflow_core::types::{input_key, output_key};
use nodeflow_core::{GraphEvent, GraphStore, NodeId, PortValues};
use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, MemoCache};
use crate::capability::ExecutableCapability;
use crate::config::EngineConfig;
use crate::dependency::{DependencyGraph, TopologicalOrder};
use crate::events::{ExecutionEvent, ExecutionObserver};
use crate::result::{ExecutionReport, ExecutionResult, ExecutionStats, NodeExecutionState};

/// Execution orchestrator
pub struct ExecutionOrchestrator {
    capability: Arc<dyn ExecutableCapability>,
    dependencies: DependencyGraph,
    results: HashMap<NodeId, ExecutionResult>,
    states: HashMap<NodeId, NodeExecutionState>,
    cache: MemoCache,
    scheduled: BTreeSet<NodeId>,
    stats: ExecutionStats,
    memoization_enabled: bool,
    execution_timeout: Duration,
    batch_depth: usize,
    deferred: Vec<GraphEvent>,
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl std::fmt::Debug for ExecutionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOrchestrator")
            .field("results", &self.results.len())
            .field("cached", &self.cache.len())
            .field("scheduled", &self.scheduled)
            .field("stats", &self.stats)
            .finish()
    }
}

impl ExecutionOrchestrator {
    /// Create an orchestrator around `capability`
    pub fn new(capability: Arc<dyn ExecutableCapability>, config: &EngineConfig) -> Self {
        Self {
            capability,
            dependencies: DependencyGraph::new(),
            results: HashMap::new(),
            states: HashMap::new(),
            cache: MemoCache::new(),
            scheduled: BTreeSet::new(),
            stats: ExecutionStats::default(),
            memoization_enabled: config.memoization_enabled,
            execution_timeout: config.execution_timeout,
            batch_depth: 0,
            deferred: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Replace the capability. Every result and cache entry is dropped.
    pub fn set_capability(&mut self, capability: Arc<dyn ExecutableCapability>) {
        self.capability = capability;
        self.results.clear();
        self.states.clear();
        self.cache.clear();
        self.dependencies.mark_dirty();
    }

    /// Enable or disable memoization. Disabling empties the cache.
    pub fn set_memoization_enabled(&mut self, enabled: bool) {
        self.memoization_enabled = enabled;
        if !enabled {
            self.cache.clear();
        }
    }

    /// Whether memoization is enabled
    pub fn memoization_enabled(&self) -> bool {
        self.memoization_enabled
    }

    /// Set the per-node execution timeout
    pub fn set_execution_timeout(&mut self, timeout: Duration) {
        self.execution_timeout = timeout;
    }

    /// Register an execution observer
    pub fn add_observer(&mut self, observer: Arc<dyn ExecutionObserver>) {
        self.observers.push(observer);
    }

    /// React to a graph change.
    ///
    /// Events between `BatchBegin` and `BatchEnd` are held back and applied
    /// together, against a single dependency rebuild, when the batch closes.
    pub fn handle_graph_event(&mut self, event: &GraphEvent, store: &GraphStore) {
        match event {
            GraphEvent::BatchBegin => self.batch_depth += 1,
            GraphEvent::BatchEnd => {
                if self.batch_depth == 0 {
                    warn!("Unmatched batch end ignored");
                    return;
                }
                self.batch_depth -= 1;
                if self.batch_depth == 0 {
                    let deferred = std::mem::take(&mut self.deferred);
                    debug!(events = deferred.len(), "Applying deferred graph events");
                    if deferred.iter().any(GraphEvent::affects_topology) {
                        self.dependencies.mark_dirty();
                    }
                    self.ensure_dependencies(store);
                    for event in &deferred {
                        self.react(event, store);
                    }
                }
            }
            other if self.batch_depth > 0 => self.deferred.push(other.clone()),
            other => {
                if other.affects_topology() {
                    self.dependencies.mark_dirty();
                }
                self.ensure_dependencies(store);
                self.react(other, store);
            }
        }
    }

    fn react(&mut self, event: &GraphEvent, store: &GraphStore) {
        match event {
            GraphEvent::NodeRemoved { node } => self.forget_node(node),
            GraphEvent::NodeConfigChanged { node } => {
                self.invalidate_node(node);
                self.schedule(node.clone());
            }
            GraphEvent::EdgeAdded { to, .. } => {
                self.invalidate_node(&to.node);
                self.schedule(to.node.clone());
            }
            GraphEvent::EdgeRemoved { to, .. } => {
                self.invalidate_node(&to.node);
                if store.contains_node(&to.node) {
                    self.schedule(to.node.clone());
                }
            }
            GraphEvent::GraphCleared => self.clear_all(),
            GraphEvent::NodeAdded { .. }
            | GraphEvent::NodeMoved { .. }
            | GraphEvent::BatchBegin
            | GraphEvent::BatchEnd => {}
        }
    }

    /// Rebuild the dependency graph if the topology changed since the last build
    pub fn ensure_dependencies(&mut self, store: &GraphStore) {
        if self.dependencies.is_dirty() {
            self.dependencies.rebuild(store, self.capability.as_ref());
        }
    }

    /// Flag the dependency graph as stale
    pub fn mark_dependencies_dirty(&mut self) {
        self.dependencies.mark_dirty();
    }

    /// Nodes ordered so that each follows its upstream dependencies
    pub fn topological_order(&mut self, store: &GraphStore) -> TopologicalOrder {
        self.ensure_dependencies(store);
        self.dependencies.topological_order()
    }

    /// Direct upstream dependencies of `node`
    pub fn upstream(&mut self, store: &GraphStore, node: &NodeId) -> BTreeSet<NodeId> {
        self.ensure_dependencies(store);
        self.dependencies.upstream(node)
    }

    /// Direct dependents of `node`
    pub fn downstream(&mut self, store: &GraphStore, node: &NodeId) -> BTreeSet<NodeId> {
        self.ensure_dependencies(store);
        self.dependencies.downstream(node)
    }

    /// Clear the current result and cache entries of every node downstream of `node`
    pub fn invalidate_downstream(&mut self, node: &NodeId) -> BTreeSet<NodeId> {
        let downstream = self.dependencies.downstream_closure(node);
        for affected in &downstream {
            self.drop_results_for(affected);
        }
        debug!(node_id = %node, invalidated = downstream.len(), "Invalidated downstream results");
        downstream
    }

    /// Invalidate `node` itself and everything downstream of it
    pub fn invalidate_node(&mut self, node: &NodeId) -> BTreeSet<NodeId> {
        self.drop_results_for(node);
        let mut affected = self.invalidate_downstream(node);
        affected.insert(node.clone());
        affected
    }

    fn drop_results_for(&mut self, node: &NodeId) {
        self.results.remove(node);
        self.cache.invalidate_node(node);
        if self.states.contains_key(node) {
            self.states.insert(node.clone(), NodeExecutionState::NotExecuted);
        }
    }

    fn forget_node(&mut self, node: &NodeId) {
        self.results.remove(node);
        self.states.remove(node);
        self.cache.invalidate_node(node);
        self.scheduled.remove(node);
        debug!(node_id = %node, "Forgot removed node");
    }

    fn clear_all(&mut self) {
        self.results.clear();
        self.states.clear();
        self.cache.clear();
        self.scheduled.clear();
        self.dependencies.mark_dirty();
        debug!("Cleared all execution state");
    }

    /// Run one node, satisfying any pending schedule for it.
    ///
    /// Never fails: an error, panic or timeout inside the capability becomes
    /// a failed result. Only successful results are memoized.
    pub async fn execute_node(&mut self, node: &NodeId, inputs: &PortValues) -> ExecutionResult {
        let capability = Arc::clone(&self.capability);
        self.scheduled.remove(node);

        if !capability.can_execute(node) {
            debug!(node_id = %node, "Node is not executable");
            let result = ExecutionResult::failure("Node is not executable", String::new(), Duration::ZERO);
            self.notify(ExecutionEvent::Failed {
                node: node.clone(),
                error: "Node is not executable".to_string(),
            });
            return result;
        }

        let config_hash = capability.execution_hash(node);
        let key = CacheKey::new(node.clone(), config_hash.clone(), hash_inputs(inputs));

        if self.memoization_enabled {
            if let Some(hit) = self.cache.get(&key).cloned() {
                self.stats.cache_hits += 1;
                debug!(node_id = %node, "Cache hit");
                self.results.insert(node.clone(), hit.clone());
                self.states.insert(node.clone(), NodeExecutionState::Completed);
                self.notify(ExecutionEvent::Completed {
                    node: node.clone(),
                    result: hit.clone(),
                    cached: true,
                });
                return hit;
            }
        }

        self.states.insert(node.clone(), NodeExecutionState::Executing);
        self.notify(ExecutionEvent::Started { node: node.clone() });
        debug!(node_id = %node, inputs = inputs.len(), "Executing node");

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.execution_timeout,
            AssertUnwindSafe(capability.execute(node, inputs)).catch_unwind(),
        )
        .await;
        let duration = started.elapsed();

        let result = match outcome {
            Ok(Ok(Ok(outputs))) => ExecutionResult::success(outputs, config_hash, duration),
            Ok(Ok(Err(e))) => ExecutionResult::failure(e.to_string(), config_hash, duration),
            Ok(Err(panic)) => ExecutionResult::failure(
                format!("Execution panicked: {}", panic_message(panic.as_ref())),
                config_hash,
                duration,
            ),
            Err(_) => ExecutionResult::failure(
                format!("Execution timed out after {:?}", self.execution_timeout),
                config_hash,
                duration,
            ),
        };

        self.stats.total_executions += 1;
        self.stats.total_duration += duration;

        if result.success {
            debug!(node_id = %node, duration_ms = duration.as_millis() as u64, "Node execution completed");
            self.states.insert(node.clone(), NodeExecutionState::Completed);
            if self.memoization_enabled {
                self.cache.insert(key, result.clone());
            }
            self.notify(ExecutionEvent::Completed {
                node: node.clone(),
                result: result.clone(),
                cached: false,
            });
        } else {
            let error = result.error.clone().unwrap_or_default();
            warn!(node_id = %node, error = %error, "Node execution failed");
            self.stats.failed_executions += 1;
            self.states.insert(node.clone(), NodeExecutionState::Failed);
            self.notify(ExecutionEvent::Failed {
                node: node.clone(),
                error,
            });
        }

        self.results.insert(node.clone(), result.clone());
        result
    }

    /// Build a node's inputs from the current results of its upstream nodes.
    ///
    /// Upstream value `output_<i>` arrives as `input_<j>` for an edge from
    /// socket `i` to socket `j`. Failed or missing upstream results contribute nothing.
    pub fn gather_inputs(&self, store: &GraphStore, node: &NodeId) -> PortValues {
        let mut inputs = PortValues::new();
        for edge in store.incoming_edges(node) {
            let Some(upstream) = self.results.get(&edge.from.node) else {
                continue;
            };
            if !upstream.success {
                continue;
            }
            if let Some(value) = upstream.outputs.get(&output_key(edge.from.index)) {
                inputs.insert(input_key(edge.to.index), value.clone());
            }
        }
        inputs
    }

    /// Run the requested nodes in dependency order
    pub async fn execute_subgraph(&mut self, store: &GraphStore, nodes: &[NodeId]) -> ExecutionReport {
        let TopologicalOrder { order, cyclic } = self.topological_order(store);
        let requested: HashSet<&NodeId> = nodes.iter().collect();

        let ordered: Vec<NodeId> = order
            .into_iter()
            .filter(|node| requested.contains(node))
            .collect();

        let mut report = ExecutionReport {
            cyclic: nodes.iter().filter(|n| cyclic.contains(*n)).cloned().collect(),
            ..Default::default()
        };
        info!(nodes = ordered.len(), cyclic = report.cyclic.len(), "Executing subgraph");

        for node in ordered {
            let inputs = self.gather_inputs(store, &node);
            let hits_before = self.stats.cache_hits;
            let result = self.execute_node(&node, &inputs).await;

            if self.stats.cache_hits > hits_before {
                report.cache_hits.push(node.clone());
            }
            if !result.success {
                report.failed.push(node.clone());
            }
            report.executed.push(node);
        }

        info!(
            executed = report.executed.len(),
            failed = report.failed.len(),
            cache_hits = report.cache_hits.len(),
            "Subgraph execution finished"
        );
        self.notify(ExecutionEvent::BatchCompleted {
            report: report.clone(),
        });
        report
    }

    /// Run every node in the store
    pub async fn execute_all(&mut self, store: &GraphStore) -> ExecutionReport {
        let nodes = store.node_ids();
        self.execute_subgraph(store, &nodes).await
    }

    /// Drain the pending batch and run it together with everything downstream of it
    pub async fn execute_scheduled(&mut self, store: &GraphStore) -> ExecutionReport {
        let scheduled = self.take_scheduled();
        if scheduled.is_empty() {
            return ExecutionReport::default();
        }
        self.ensure_dependencies(store);

        let mut nodes: BTreeSet<NodeId> = BTreeSet::new();
        for node in scheduled {
            if !store.contains_node(&node) {
                continue;
            }
            nodes.extend(self.dependencies.downstream_closure(&node));
            nodes.insert(node);
        }
        debug!(nodes = nodes.len(), "Processing scheduled executions");

        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        self.execute_subgraph(store, &nodes).await
    }

    /// Add a node to the pending batch; returns false if it was already pending
    pub fn schedule(&mut self, node: NodeId) -> bool {
        self.scheduled.insert(node)
    }

    /// Drain the pending batch
    pub fn take_scheduled(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.scheduled).into_iter().collect()
    }

    /// Nodes waiting for the next batch
    pub fn scheduled(&self) -> &BTreeSet<NodeId> {
        &self.scheduled
    }

    /// Current result of a node
    pub fn result(&self, node: &NodeId) -> Option<&ExecutionResult> {
        self.results.get(node)
    }

    /// Whether a node has a current result
    pub fn has_result(&self, node: &NodeId) -> bool {
        self.results.contains_key(node)
    }

    /// Execution state of a node
    pub fn node_state(&self, node: &NodeId) -> NodeExecutionState {
        self.states
            .get(node)
            .copied()
            .unwrap_or(NodeExecutionState::NotExecuted)
    }

    /// Aggregate counters
    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    /// Reset the counters
    pub fn reset_stats(&mut self) {
        self.stats = ExecutionStats::default();
    }

    /// Number of memoized results
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every memoized result
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop a node's memoized results
    pub fn clear_cache_for(&mut self, node: &NodeId) -> usize {
        self.cache.invalidate_node(node)
    }

    fn notify(&self, event: ExecutionEvent) {
        for observer in &self.observers {
            observer.on_execution_event(&event);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use async_trait::async_trait;
    use mockall::mock;
    use nodeflow_core::hashing::hash_value;
    use nodeflow_core::{Node, NodeTypeRegistry, Point2D, SocketAddress};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    /// Adds the node's factor to `input_0` (or starts from 1) and counts calls
    #[derive(Default)]
    struct CountingCapability {
        factors: Mutex<HashMap<NodeId, i64>>,
        calls: Mutex<HashMap<NodeId, usize>>,
    }

    impl CountingCapability {
        fn set_factor(&self, node: &str, factor: i64) {
            self.factors.lock().insert(NodeId::from(node), factor);
        }

        fn calls(&self, node: &str) -> usize {
            self.calls.lock().get(&NodeId::from(node)).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl ExecutableCapability for CountingCapability {
        fn can_execute(&self, _node: &NodeId) -> bool {
            true
        }

        async fn execute(&self, node: &NodeId, inputs: &PortValues) -> Result<PortValues, CapabilityError> {
            *self.calls.lock().entry(node.clone()).or_default() += 1;
            let factor = self.factors.lock().get(node).copied().unwrap_or(0);
            let base = inputs.get("input_0").and_then(Value::as_i64).unwrap_or(1);
            let mut outputs = PortValues::new();
            outputs.insert("output_1".to_string(), json!(base + factor));
            outputs.insert("output_0".to_string(), json!(base + factor));
            Ok(outputs)
        }

        fn execution_hash(&self, node: &NodeId) -> String {
            hash_value(&json!(self.factors.lock().get(node).copied().unwrap_or(0)))
        }
    }

    mock! {
        pub Capability {}

        #[async_trait]
        impl ExecutableCapability for Capability {
            fn can_execute(&self, node: &NodeId) -> bool;
            async fn execute(&self, node: &NodeId, inputs: &PortValues) -> Result<PortValues, CapabilityError>;
            fn execution_hash(&self, node: &NodeId) -> String;
            fn dependencies(&self, node: &NodeId) -> Vec<NodeId>;
        }
    }

    fn chain_store() -> GraphStore {
        // a -> b -> c, plus an unrelated transform d
        let mut store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
        for id in ["a", "b", "c", "d"] {
            store
                .insert_node(Node::new(NodeId::from(id), "TRANSFORM", 1, 1, Point2D::default()).unwrap())
                .unwrap();
        }
        store.connect(SocketAddress::new("a", 1), SocketAddress::new("b", 0)).unwrap();
        store.connect(SocketAddress::new("b", 1), SocketAddress::new("c", 0)).unwrap();
        store.take_events();
        store
    }

    fn orchestrator(capability: Arc<dyn ExecutableCapability>) -> ExecutionOrchestrator {
        ExecutionOrchestrator::new(capability, &EngineConfig::default())
    }

    #[tokio::test]
    async fn test_memoized_execution_invokes_capability_once() {
        let capability = Arc::new(CountingCapability::default());
        let mut orchestrator = orchestrator(capability.clone());
        let node = NodeId::from("a");
        let mut inputs = PortValues::new();
        inputs.insert("input_0".to_string(), json!(5));

        let first = orchestrator.execute_node(&node, &inputs).await;
        let second = orchestrator.execute_node(&node, &inputs).await;

        assert_eq!(capability.calls("a"), 1);
        assert_eq!(first.outputs, second.outputs);
        assert_eq!(orchestrator.stats().cache_hits, 1);
        assert_eq!(orchestrator.stats().total_executions, 1);
        assert_eq!(orchestrator.node_state(&node), NodeExecutionState::Completed);
    }

    #[tokio::test]
    async fn test_memoization_can_be_disabled() {
        let capability = Arc::new(CountingCapability::default());
        let mut orchestrator = orchestrator(capability.clone());
        orchestrator.set_memoization_enabled(false);
        let node = NodeId::from("a");

        orchestrator.execute_node(&node, &PortValues::new()).await;
        orchestrator.execute_node(&node, &PortValues::new()).await;

        assert_eq!(capability.calls("a"), 2);
        assert_eq!(orchestrator.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_subgraph_passes_outputs_downstream() {
        let store = chain_store();
        let capability = Arc::new(CountingCapability::default());
        capability.set_factor("a", 1);
        capability.set_factor("b", 10);
        capability.set_factor("c", 100);
        let mut orchestrator = orchestrator(capability.clone());

        let report = orchestrator.execute_all(&store).await;

        assert!(report.all_succeeded());
        let position = |id: &str| report.executed.iter().position(|n| n.as_str() == id).unwrap();
        assert!(position("a") < position("b"));
        assert!(position("b") < position("c"));
        let c = orchestrator.result(&NodeId::from("c")).unwrap();
        assert_eq!(c.outputs["output_1"], json!(112));
    }

    #[tokio::test]
    async fn test_config_change_recomputes_only_downstream() {
        let mut store = chain_store();
        let capability = Arc::new(CountingCapability::default());
        let mut orchestrator = orchestrator(capability.clone());
        orchestrator.execute_all(&store).await;

        capability.set_factor("a", 7);
        store.set_node_config(&NodeId::from("a"), json!({"factor": 7})).unwrap();
        for event in store.take_events() {
            orchestrator.handle_graph_event(&event, &store);
        }

        assert!(!orchestrator.has_result(&NodeId::from("b")));
        assert!(orchestrator.has_result(&NodeId::from("d")));
        assert_eq!(orchestrator.scheduled(), &BTreeSet::from([NodeId::from("a")]));

        orchestrator.execute_all(&store).await;

        for (node, calls) in [("a", 2), ("b", 2), ("c", 2), ("d", 1)] {
            assert_eq!(capability.calls(node), calls, "calls for {}", node);
        }
    }

    #[tokio::test]
    async fn test_edge_removal_invalidates_former_target_only() {
        let mut store = chain_store();
        let capability = Arc::new(CountingCapability::default());
        let mut orchestrator = orchestrator(capability);
        orchestrator.execute_all(&store).await;

        let edge = store.incoming_edges(&NodeId::from("c"))[0].id.clone();
        store.remove_edge(&edge).unwrap();
        for event in store.take_events() {
            orchestrator.handle_graph_event(&event, &store);
        }

        assert!(orchestrator.has_result(&NodeId::from("a")));
        assert!(orchestrator.has_result(&NodeId::from("b")));
        assert!(!orchestrator.has_result(&NodeId::from("c")));
        assert!(orchestrator.downstream(&store, &NodeId::from("b")).is_empty());
    }

    #[tokio::test]
    async fn test_batched_events_apply_at_batch_end() {
        let mut store = chain_store();
        let capability = Arc::new(CountingCapability::default());
        let mut orchestrator = orchestrator(capability);

        store.begin_batch();
        store.remove_node(&NodeId::from("d")).unwrap();
        store
            .insert_node(Node::new(NodeId::from("e"), "SINK", 1, 0, Point2D::default()).unwrap())
            .unwrap();
        store.connect(SocketAddress::new("c", 1), SocketAddress::new("e", 0)).unwrap();
        let mut events = store.take_events();
        let end = events.len();

        for event in &events {
            orchestrator.handle_graph_event(event, &store);
        }
        assert!(orchestrator.scheduled().is_empty());

        store.end_batch();
        events = store.take_events();
        assert_eq!(end, 4);
        for event in &events {
            orchestrator.handle_graph_event(event, &store);
        }

        assert_eq!(orchestrator.scheduled(), &BTreeSet::from([NodeId::from("e")]));
        assert_eq!(
            orchestrator.downstream(&store, &NodeId::from("c")),
            BTreeSet::from([NodeId::from("e")])
        );
    }

    #[tokio::test]
    async fn test_graph_cleared_drops_everything() {
        let mut store = chain_store();
        let capability = Arc::new(CountingCapability::default());
        let mut orchestrator = orchestrator(capability);
        orchestrator.execute_all(&store).await;

        store.clear();
        for event in store.take_events() {
            orchestrator.handle_graph_event(&event, &store);
        }

        assert!(!orchestrator.has_result(&NodeId::from("a")));
        assert_eq!(orchestrator.cache_len(), 0);
        assert!(orchestrator.scheduled().is_empty());
        assert!(orchestrator.topological_order(&store).order.is_empty());
    }

    #[tokio::test]
    async fn test_non_executable_node_is_skipped_without_invoking() {
        let mut mock = MockCapability::new();
        mock.expect_can_execute().returning(|_| false);
        mock.expect_execute().never();
        let mut orchestrator = orchestrator(Arc::new(mock));

        let result = orchestrator.execute_node(&NodeId::from("x"), &PortValues::new()).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Node is not executable"));
        assert_eq!(orchestrator.stats().total_executions, 0);
    }

    #[tokio::test]
    async fn test_capability_error_becomes_failed_result() {
        let mut mock = MockCapability::new();
        mock.expect_can_execute().returning(|_| true);
        mock.expect_execution_hash().returning(|_| "sha256:fixed".to_string());
        mock.expect_execute()
            .times(2)
            .returning(|_, _| Err(CapabilityError::ExecutionFailed("bad script".to_string())));
        let mut orchestrator = orchestrator(Arc::new(mock));
        let node = NodeId::from("x");

        let first = orchestrator.execute_node(&node, &PortValues::new()).await;
        let second = orchestrator.execute_node(&node, &PortValues::new()).await;

        assert_eq!(first.error.as_deref(), Some("Execution failed: bad script"));
        assert!(!second.success);
        assert_eq!(orchestrator.stats().failed_executions, 2);
        assert_eq!(orchestrator.node_state(&node), NodeExecutionState::Failed);
        assert_eq!(orchestrator.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_capability_dependencies_extend_the_graph() {
        let store = chain_store();
        let mut mock = MockCapability::new();
        mock.expect_dependencies().returning(|node| {
            if node.as_str() == "d" {
                vec![NodeId::from("c"), NodeId::from("ghost")]
            } else {
                Vec::new()
            }
        });
        let mut orchestrator = orchestrator(Arc::new(mock));

        let order = orchestrator.topological_order(&store).order;

        let position = |id: &str| order.iter().position(|n| n.as_str() == id).unwrap();
        assert!(position("c") < position("d"));
        assert_eq!(
            orchestrator.upstream(&store, &NodeId::from("d")),
            BTreeSet::from([NodeId::from("c")])
        );
    }
}
