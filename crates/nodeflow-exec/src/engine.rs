//! The graph engine: single owner of the store and the orchestrator.
//!
//! Every public operation takes one exclusive lock covering the graph store
//! and all execution state. Waiting for that lock is bounded by
//! [`EngineConfig::lock_wait`]; when it expires the call reports
//! [`EngineError::Busy`] instead of blocking indefinitely.

use futures::FutureExt;
use nodeflow_core::{
    Edge, EdgeId, GraphObserver, GraphStats, GraphStore, Node, NodeId, NodeTypeRegistry, Point2D,
    PortValues, SocketAddress, SocketIndex,
};
use nodeflow_loader::{export_description, GraphDescription, GraphLoader, LoadReport};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::capability::ExecutableCapability;
use crate::config::EngineConfig;
use crate::dependency::TopologicalOrder;
use crate::error::{EngineError, EngineResult};
use crate::events::ExecutionObserver;
use crate::orchestrator::ExecutionOrchestrator;
use crate::result::{ExecutionReport, ExecutionResult, ExecutionStats, NodeExecutionState};
use crate::scheduler::{DebounceScheduler, FlushFn};

struct EngineState {
    store: GraphStore,
    orchestrator: ExecutionOrchestrator,
}

struct EngineInner {
    state: Mutex<EngineState>,
    config: EngineConfig,
    graph_observers: RwLock<Vec<Arc<dyn GraphObserver>>>,
}

impl EngineInner {
    async fn lock(&self) -> EngineResult<MutexGuard<'_, EngineState>> {
        match tokio::time::timeout(self.config.lock_wait, self.state.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(wait_ms = self.config.lock_wait.as_millis() as u64, "Engine busy");
                Err(EngineError::Busy(self.config.lock_wait))
            }
        }
    }

    /// Forward pending store events to the orchestrator, then to graph observers.
    /// Returns whether any node is waiting for scheduled execution.
    fn dispatch(&self, state: &mut EngineState) -> bool {
        let events = state.store.take_events();
        if events.is_empty() {
            return !state.orchestrator.scheduled().is_empty();
        }

        let observers = self.graph_observers.read().clone();
        for event in &events {
            state.orchestrator.handle_graph_event(event, &state.store);
            for observer in &observers {
                observer.on_graph_event(event);
            }
        }
        !state.orchestrator.scheduled().is_empty()
    }

    async fn flush_scheduled(&self) -> EngineResult<ExecutionReport> {
        let mut guard = self.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        Ok(orchestrator.execute_scheduled(store).await)
    }

    /// Run the pending batch on behalf of the scheduler.
    ///
    /// Waits for the lock without the `lock_wait` bound: the batch is queued
    /// behind whatever call holds the lock instead of being dropped.
    async fn run_deferred(&self) -> ExecutionReport {
        let mut guard = self.state.lock().await;
        let EngineState { store, orchestrator } = &mut *guard;
        orchestrator.execute_scheduled(store).await
    }
}

/// Graph engine
pub struct GraphEngine {
    inner: Arc<EngineInner>,
    scheduler: DebounceScheduler,
}

impl std::fmt::Debug for GraphEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphEngine")
            .field("config", &self.inner.config)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl GraphEngine {
    /// Create an engine with an empty graph.
    ///
    /// When called inside a tokio runtime, scheduled work runs automatically
    /// after the debounce delay; otherwise only [`GraphEngine::flush_scheduled`] runs it.
    pub fn new(
        registry: Arc<NodeTypeRegistry>,
        capability: Arc<dyn ExecutableCapability>,
        config: EngineConfig,
    ) -> Self {
        let orchestrator = ExecutionOrchestrator::new(capability, &config);
        let inner = Arc::new(EngineInner {
            state: Mutex::new(EngineState {
                store: GraphStore::new(registry),
                orchestrator,
            }),
            config: config.clone(),
            graph_observers: RwLock::new(Vec::new()),
        });

        let scheduler = DebounceScheduler::spawn(config.debounce, scheduled_flush(Arc::downgrade(&inner)));
        info!(
            debounce_ms = config.debounce.as_millis() as u64,
            memoization = config.memoization_enabled,
            "Graph engine created"
        );

        Self { inner, scheduler }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Register an observer for graph change events
    pub fn add_graph_observer(&self, observer: Arc<dyn GraphObserver>) {
        self.inner.graph_observers.write().push(observer);
    }

    /// Register an observer for execution events
    pub async fn add_execution_observer(&self, observer: Arc<dyn ExecutionObserver>) -> EngineResult<()> {
        let mut state = self.inner.lock().await?;
        state.orchestrator.add_observer(observer);
        Ok(())
    }

    async fn mutate<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnOnce(&mut GraphStore) -> Result<T, EngineError>,
    {
        let mut state = self.inner.lock().await?;
        let result = op(&mut state.store);
        let pending = self.inner.dispatch(&mut state);
        drop(state);

        if pending {
            self.scheduler.notify();
        }
        result
    }

    async fn read<T, F>(&self, op: F) -> EngineResult<T>
    where
        F: FnOnce(&GraphStore) -> T,
    {
        let state = self.inner.lock().await?;
        Ok(op(&state.store))
    }

    // Graph mutation

    /// Create a node of a registered type with a fresh id
    pub async fn create_node(&self, kind: &str, position: Point2D) -> EngineResult<NodeId> {
        self.mutate(|store| Ok(store.create_node(kind, position)?)).await
    }

    /// Create a node with an explicit id, socket counts and configuration
    pub async fn create_node_with(
        &self,
        id: NodeId,
        kind: &str,
        inputs: u32,
        outputs: u32,
        position: Point2D,
        config: Value,
    ) -> EngineResult<NodeId> {
        self.mutate(|store| Ok(store.create_node_with(id, kind, inputs, outputs, position, config)?))
            .await
    }

    /// Insert a fully built node
    pub async fn insert_node(&self, node: Node) -> EngineResult<NodeId> {
        self.mutate(|store| Ok(store.insert_node(node)?)).await
    }

    /// Remove a node and every edge touching it
    pub async fn remove_node(&self, id: &NodeId) -> EngineResult<Node> {
        self.mutate(|store| Ok(store.remove_node(id)?)).await
    }

    /// Move a node
    pub async fn move_node(&self, id: &NodeId, position: Point2D) -> EngineResult<()> {
        self.mutate(|store| Ok(store.move_node(id, position)?)).await
    }

    /// Replace a node's configuration
    pub async fn set_node_config(&self, id: &NodeId, config: Value) -> EngineResult<()> {
        self.mutate(|store| Ok(store.set_node_config(id, config)?)).await
    }

    /// Connect an output socket to an input socket with a new resolved edge
    pub async fn connect(
        &self,
        from_node: &NodeId,
        from_index: SocketIndex,
        to_node: &NodeId,
        to_index: SocketIndex,
    ) -> EngineResult<EdgeId> {
        let from = SocketAddress::new(from_node.clone(), from_index);
        let to = SocketAddress::new(to_node.clone(), to_index);
        self.mutate(|store| Ok(store.connect(from, to)?)).await
    }

    /// Remove an edge
    pub async fn disconnect(&self, id: &EdgeId) -> EngineResult<Edge> {
        self.mutate(|store| Ok(store.remove_edge(id)?)).await
    }

    /// Remove everything
    pub async fn clear(&self) -> EngineResult<()> {
        self.mutate(|store| {
            store.clear();
            Ok(())
        })
        .await
    }

    /// Load a description transactionally into the live graph
    pub async fn load(&self, description: &GraphDescription) -> EngineResult<LoadReport> {
        self.mutate(|store| Ok(GraphLoader::new().load(store, description)?))
            .await
    }

    /// Load a JSON or YAML description file, format chosen by extension
    pub async fn load_file(&self, path: impl AsRef<Path>) -> EngineResult<LoadReport> {
        let description = GraphDescription::from_path(path)?;
        self.load(&description).await
    }

    // Graph queries

    /// Snapshot of the graph as a description
    pub async fn export(&self) -> EngineResult<GraphDescription> {
        self.read(export_description).await
    }

    /// Check every store invariant
    pub async fn validate_integrity(&self) -> EngineResult<()> {
        self.read(|store| store.validate_integrity()).await??;
        Ok(())
    }

    /// All node ids, sorted
    pub async fn node_ids(&self) -> EngineResult<Vec<NodeId>> {
        self.read(GraphStore::node_ids).await
    }

    /// A copy of a node
    pub async fn node(&self, id: &NodeId) -> EngineResult<Option<Node>> {
        self.read(|store| store.node(id).cloned()).await
    }

    /// All edge ids, sorted
    pub async fn edge_ids(&self) -> EngineResult<Vec<EdgeId>> {
        self.read(GraphStore::edge_ids).await
    }

    /// A copy of an edge
    pub async fn edge(&self, id: &EdgeId) -> EngineResult<Option<Edge>> {
        self.read(|store| store.edge(id).cloned()).await
    }

    /// Store counters
    pub async fn graph_stats(&self) -> EngineResult<GraphStats> {
        self.read(GraphStore::stats).await
    }

    /// Run a read-only closure against the store
    pub async fn with_store<T>(&self, op: impl FnOnce(&GraphStore) -> T) -> EngineResult<T> {
        self.read(op).await
    }

    // Dependency queries

    /// Nodes in dependency order, with cyclic nodes reported separately
    pub async fn topological_order(&self) -> EngineResult<TopologicalOrder> {
        let mut guard = self.inner.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        Ok(orchestrator.topological_order(store))
    }

    /// Direct upstream dependencies of a node
    pub async fn upstream(&self, id: &NodeId) -> EngineResult<BTreeSet<NodeId>> {
        let mut guard = self.inner.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        Ok(orchestrator.upstream(store, id))
    }

    /// Direct dependents of a node
    pub async fn downstream(&self, id: &NodeId) -> EngineResult<BTreeSet<NodeId>> {
        let mut guard = self.inner.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        Ok(orchestrator.downstream(store, id))
    }

    // Execution

    /// Execute one node on inputs gathered from its upstream results
    pub async fn execute_node(&self, id: &NodeId) -> EngineResult<ExecutionResult> {
        let mut guard = self.inner.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        if !store.contains_node(id) {
            return Err(nodeflow_core::CoreError::NodeNotFound(id.clone()).into());
        }
        let inputs = orchestrator.gather_inputs(store, id);
        Ok(orchestrator.execute_node(id, &inputs).await)
    }

    /// Execute one node on caller supplied inputs
    pub async fn execute_node_with(&self, id: &NodeId, inputs: &PortValues) -> EngineResult<ExecutionResult> {
        let mut state = self.inner.lock().await?;
        Ok(state.orchestrator.execute_node(id, inputs).await)
    }

    /// Execute the given nodes in dependency order
    pub async fn execute_subgraph(&self, ids: &[NodeId]) -> EngineResult<ExecutionReport> {
        let mut guard = self.inner.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        Ok(orchestrator.execute_subgraph(store, ids).await)
    }

    /// Execute every node in dependency order
    pub async fn execute_all(&self) -> EngineResult<ExecutionReport> {
        let mut guard = self.inner.lock().await?;
        let EngineState { store, orchestrator } = &mut *guard;
        Ok(orchestrator.execute_all(store).await)
    }

    /// Queue a node for the next debounced batch
    pub async fn schedule_execution(&self, id: &NodeId) -> EngineResult<()> {
        let mut state = self.inner.lock().await?;
        state.orchestrator.schedule(id.clone());
        drop(state);
        self.scheduler.notify();
        Ok(())
    }

    /// Run the pending batch now
    pub async fn flush_scheduled(&self) -> EngineResult<ExecutionReport> {
        self.inner.flush_scheduled().await
    }

    /// Nodes waiting for the next batch
    pub async fn scheduled(&self) -> EngineResult<BTreeSet<NodeId>> {
        let state = self.inner.lock().await?;
        Ok(state.orchestrator.scheduled().clone())
    }

    // Execution queries and controls

    /// Current result of a node
    pub async fn result(&self, id: &NodeId) -> EngineResult<Option<ExecutionResult>> {
        let state = self.inner.lock().await?;
        Ok(state.orchestrator.result(id).cloned())
    }

    /// Whether a node has a current result
    pub async fn has_result(&self, id: &NodeId) -> EngineResult<bool> {
        let state = self.inner.lock().await?;
        Ok(state.orchestrator.has_result(id))
    }

    /// Execution state of a node
    pub async fn node_state(&self, id: &NodeId) -> EngineResult<NodeExecutionState> {
        let state = self.inner.lock().await?;
        Ok(state.orchestrator.node_state(id))
    }

    /// Aggregate execution counters
    pub async fn execution_stats(&self) -> EngineResult<ExecutionStats> {
        let state = self.inner.lock().await?;
        Ok(state.orchestrator.stats())
    }

    /// Reset the execution counters
    pub async fn reset_stats(&self) -> EngineResult<()> {
        let mut state = self.inner.lock().await?;
        state.orchestrator.reset_stats();
        Ok(())
    }

    /// Drop every memoized result
    pub async fn clear_cache(&self) -> EngineResult<()> {
        let mut state = self.inner.lock().await?;
        state.orchestrator.clear_cache();
        Ok(())
    }

    /// Drop one node's memoized results
    pub async fn clear_cache_for(&self, id: &NodeId) -> EngineResult<usize> {
        let mut state = self.inner.lock().await?;
        Ok(state.orchestrator.clear_cache_for(id))
    }

    /// Replace the executable capability
    pub async fn set_capability(&self, capability: Arc<dyn ExecutableCapability>) -> EngineResult<()> {
        let mut state = self.inner.lock().await?;
        state.orchestrator.set_capability(capability);
        Ok(())
    }

    /// Enable or disable memoization
    pub async fn set_memoization_enabled(&self, enabled: bool) -> EngineResult<()> {
        let mut state = self.inner.lock().await?;
        state.orchestrator.set_memoization_enabled(enabled);
        Ok(())
    }
}

fn scheduled_flush(inner: Weak<EngineInner>) -> FlushFn {
    Box::new(move || {
        let inner = inner.clone();
        async move {
            let Some(inner) = inner.upgrade() else {
                return false;
            };
            let report = inner.run_deferred().await;
            debug!(executed = report.executed.len(), "Scheduled batch finished");
            true
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct SlowCapability {
        delay: Duration,
    }

    #[async_trait]
    impl ExecutableCapability for SlowCapability {
        fn can_execute(&self, _node: &NodeId) -> bool {
            true
        }

        async fn execute(&self, _node: &NodeId, _inputs: &PortValues) -> Result<PortValues, CapabilityError> {
            tokio::time::sleep(self.delay).await;
            let mut outputs = PortValues::new();
            outputs.insert("output_0".to_string(), json!("done"));
            Ok(outputs)
        }

        fn execution_hash(&self, node: &NodeId) -> String {
            node.to_string()
        }
    }

    fn engine(delay: Duration, config: EngineConfig) -> GraphEngine {
        GraphEngine::new(
            Arc::new(NodeTypeRegistry::with_builtin_types()),
            Arc::new(SlowCapability { delay }),
            config,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_when_lock_wait_expires() {
        let config = EngineConfig::default()
            .with_lock_wait(Duration::from_millis(10))
            .with_execution_timeout(Duration::from_secs(60));
        let engine = Arc::new(engine(Duration::from_secs(1), config));
        engine.create_node("SOURCE", Point2D::default()).await.unwrap();

        let running = tokio::spawn({
            let engine = engine.clone();
            async move { engine.execute_all().await }
        });
        tokio::task::yield_now().await;

        let err = engine.execute_all().await.unwrap_err();
        assert!(err.is_busy());

        let report = running.await.unwrap().unwrap();
        assert_eq!(report.executed.len(), 1);
        assert!(report.all_succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_capability_times_out_as_failure() {
        let config = EngineConfig::default().with_execution_timeout(Duration::from_millis(100));
        let engine = engine(Duration::from_secs(10), config);
        let id = engine.create_node("SOURCE", Point2D::default()).await.unwrap();

        let result = engine.execute_node(&id).await.unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
        assert_eq!(engine.node_state(&id).await.unwrap(), NodeExecutionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_batch_waits_for_long_running_call() {
        let config = EngineConfig::default()
            .with_debounce(Duration::from_millis(50))
            .with_lock_wait(Duration::from_millis(10))
            .with_execution_timeout(Duration::from_secs(60));
        let engine = Arc::new(engine(Duration::from_secs(1), config));
        let a = engine.create_node("SOURCE", Point2D::default()).await.unwrap();
        let b = engine.create_node("SOURCE", Point2D::new(100.0, 0.0)).await.unwrap();

        engine.schedule_execution(&b).await.unwrap();
        let running = tokio::spawn({
            let engine = engine.clone();
            let a = a.clone();
            async move { engine.execute_node(&a).await }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(running.await.unwrap().unwrap().success);
        assert!(engine.has_result(&b).await.unwrap());
        assert!(engine.scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_unknown_node_is_an_error() {
        let engine = engine(Duration::ZERO, EngineConfig::default());
        let err = engine.execute_node(&NodeId::from("ghost")).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }
}
