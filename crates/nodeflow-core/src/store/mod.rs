//! The authoritative collection of nodes and edges.
//!
//! [`GraphStore`] owns every node and edge keyed by id. Mutations record
//! [`GraphEvent`]s in a pending queue which the owner drains with
//! [`GraphStore::take_events`] and forwards to observers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::edge::Edge;
use crate::domain::events::GraphEvent;
use crate::domain::ids::{EdgeId, NodeId};
use crate::domain::node::{Node, Point2D};
use crate::domain::registry::NodeTypeRegistry;
use crate::error::{CoreError, CoreResult};

mod integrity;
mod resolution;

/// Counts describing the current store contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of nodes
    pub node_count: usize,
    /// Number of edges, resolved or not
    pub edge_count: usize,
    /// Number of edges bound to live sockets
    pub resolved_edge_count: usize,
}

/// Graph store: nodes and edges keyed by id
#[derive(Debug)]
pub struct GraphStore {
    registry: Arc<NodeTypeRegistry>,
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, Edge>,
    pending_events: Vec<GraphEvent>,
    batch_depth: usize,
}

impl GraphStore {
    /// Create an empty store validating node types against `registry`
    pub fn new(registry: Arc<NodeTypeRegistry>) -> Self {
        Self {
            registry,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            pending_events: Vec::new(),
            batch_depth: 0,
        }
    }

    /// The node type registry
    pub fn registry(&self) -> &Arc<NodeTypeRegistry> {
        &self.registry
    }

    /// Create a node of a registered type with a fresh id and the type's socket counts
    pub fn create_node(&mut self, kind: &str, position: Point2D) -> CoreResult<NodeId> {
        let spec = self
            .registry
            .get(kind)
            .ok_or_else(|| CoreError::UnknownNodeType(kind.to_string()))?;

        let node = Node::new(NodeId::new_v4(), kind, spec.inputs, spec.outputs, position)?
            .with_config(spec.default_config.clone());
        self.insert_node(node)
    }

    /// Create a node with an explicit id, socket counts and configuration
    pub fn create_node_with(
        &mut self,
        id: NodeId,
        kind: &str,
        inputs: u32,
        outputs: u32,
        position: Point2D,
        config: Value,
    ) -> CoreResult<NodeId> {
        let node = Node::new(id, kind, inputs, outputs, position)?.with_config(config);
        self.insert_node(node)
    }

    /// Insert a fully built node.
    ///
    /// The node's type must be registered and its id unused. Any socket
    /// bindings the node carries are dropped; edges attach through resolution.
    pub fn insert_node(&mut self, mut node: Node) -> CoreResult<NodeId> {
        if !self.registry.contains(&node.kind) {
            return Err(CoreError::UnknownNodeType(node.kind));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(CoreError::DuplicateNodeId(node.id));
        }

        node.reset_bindings();
        let id = node.id.clone();
        debug!(node_id = %id, kind = %node.kind, "Adding node");
        self.nodes.insert(id.clone(), node);
        self.emit(GraphEvent::NodeAdded { node: id.clone() });
        Ok(id)
    }

    /// Insert an edge in unresolved form
    pub fn insert_edge(&mut self, mut edge: Edge) -> CoreResult<EdgeId> {
        if self.edges.contains_key(&edge.id) {
            return Err(CoreError::DuplicateEdgeId(edge.id));
        }

        edge.resolution = None;
        let id = edge.id.clone();
        debug!(edge_id = %id, from = %edge.from, to = %edge.to, "Adding unresolved edge");
        self.edges.insert(id.clone(), edge);
        Ok(id)
    }

    /// Remove an edge, unbinding its sockets if it was resolved
    pub fn remove_edge(&mut self, id: &EdgeId) -> CoreResult<Edge> {
        let edge = self
            .edges
            .remove(id)
            .ok_or_else(|| CoreError::EdgeNotFound(id.clone()))?;

        if edge.is_resolved() {
            self.unbind(&edge);
            self.emit(GraphEvent::EdgeRemoved {
                edge: edge.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
            });
        }
        debug!(edge_id = %id, "Removed edge");
        Ok(edge)
    }

    /// Remove a node and every edge that references it
    pub fn remove_node(&mut self, id: &NodeId) -> CoreResult<Node> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| CoreError::NodeNotFound(id.clone()))?;

        let mut doomed: BTreeSet<EdgeId> = node.incident_edges().clone();
        doomed.extend(
            self.edges
                .values()
                .filter(|edge| !edge.is_resolved() && edge.touches(id))
                .map(|edge| edge.id.clone()),
        );

        for edge_id in &doomed {
            self.remove_edge(edge_id)?;
        }

        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| CoreError::NodeNotFound(id.clone()))?;
        debug!(node_id = %id, removed_edges = doomed.len(), "Removed node");
        self.emit(GraphEvent::NodeRemoved { node: id.clone() });
        Ok(node)
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, id: &NodeId, position: Point2D) -> CoreResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound(id.clone()))?;

        let old = node.position;
        node.position = position;
        self.emit(GraphEvent::NodeMoved {
            node: id.clone(),
            old,
            new: position,
        });
        Ok(())
    }

    /// Replace a node's configuration
    pub fn set_node_config(&mut self, id: &NodeId, config: Value) -> CoreResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| CoreError::NodeNotFound(id.clone()))?;

        node.config = config;
        debug!(node_id = %id, "Node configuration changed");
        self.emit(GraphEvent::NodeConfigChanged { node: id.clone() });
        Ok(())
    }

    /// Remove every edge, then every node, inside a single batch
    pub fn clear(&mut self) {
        self.begin_batch();

        for edge_id in self.edge_ids() {
            if let Err(e) = self.remove_edge(&edge_id) {
                warn!(edge_id = %edge_id, error = %e, "Failed to remove edge while clearing");
            }
        }
        for node_id in self.node_ids() {
            if let Err(e) = self.remove_node(&node_id) {
                warn!(node_id = %node_id, error = %e, "Failed to remove node while clearing");
            }
        }

        self.emit(GraphEvent::GraphCleared);
        self.end_batch();
    }

    /// Get a node
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node exists
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids, sorted
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Get an edge
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Whether an edge exists
    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Iterate over all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Iterate over edges bound to live sockets
    pub fn resolved_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(|edge| edge.is_resolved())
    }

    /// All edge ids, sorted
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self.edges.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Store counters
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            resolved_edge_count: self.resolved_edges().count(),
        }
    }

    /// Resolved edges whose target is `node`, ordered by target socket
    pub fn incoming_edges(&self, node: &NodeId) -> Vec<&Edge> {
        let mut edges = self.incident(node, |edge| &edge.to.node == node);
        edges.sort_by_key(|edge| edge.to.index);
        edges
    }

    /// Resolved edges whose source is `node`, ordered by source socket
    pub fn outgoing_edges(&self, node: &NodeId) -> Vec<&Edge> {
        let mut edges = self.incident(node, |edge| &edge.from.node == node);
        edges.sort_by_key(|edge| edge.from.index);
        edges
    }

    /// Nodes with a resolved edge into `node`
    pub fn upstream_nodes(&self, node: &NodeId) -> BTreeSet<NodeId> {
        self.incoming_edges(node)
            .into_iter()
            .map(|edge| edge.from.node.clone())
            .collect()
    }

    /// Nodes with a resolved edge out of `node`
    pub fn downstream_nodes(&self, node: &NodeId) -> BTreeSet<NodeId> {
        self.outgoing_edges(node)
            .into_iter()
            .map(|edge| edge.to.node.clone())
            .collect()
    }

    fn incident<F>(&self, node: &NodeId, keep: F) -> Vec<&Edge>
    where
        F: Fn(&Edge) -> bool,
    {
        self.nodes
            .get(node)
            .map(|n| {
                n.incident_edges()
                    .iter()
                    .filter_map(|id| self.edges.get(id))
                    .filter(|edge| keep(edge))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Open a batch. Nested batches emit a single begin/end pair.
    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.pending_events.push(GraphEvent::BatchBegin);
        }
        self.batch_depth += 1;
    }

    /// Close a batch opened with [`GraphStore::begin_batch`]
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            warn!("end_batch called without a matching begin_batch");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.pending_events.push(GraphEvent::BatchEnd);
        }
    }

    /// Whether a batch is open
    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Position in the pending event queue, for use with [`GraphStore::abort_batch`]
    pub fn event_mark(&self) -> usize {
        self.pending_events.len()
    }

    /// Close the innermost batch and forget every event recorded since `mark`.
    ///
    /// Used when a bulk operation has undone its own mutations and observers
    /// must not hear about them.
    pub fn abort_batch(&mut self, mark: usize) {
        self.pending_events.truncate(mark);
        self.batch_depth = self.batch_depth.saturating_sub(1);
    }

    /// Drain pending events in emission order
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn emit(&mut self, event: GraphEvent) {
        self.pending_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::socket::SocketAddress;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> GraphStore {
        GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()))
    }

    fn add(store: &mut GraphStore, id: &str, kind: &str, inputs: u32, outputs: u32) -> NodeId {
        store
            .insert_node(Node::new(NodeId::from(id), kind, inputs, outputs, Point2D::default()).unwrap())
            .unwrap()
    }

    #[test]
    fn test_create_node_uses_type_socket_counts() {
        let mut store = store();
        let id = store.create_node("SPLIT", Point2D::new(5.0, 5.0)).unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!((node.input_count(), node.output_count()), (1, 2));
        assert_eq!(store.take_events(), vec![GraphEvent::NodeAdded { node: id }]);
    }

    #[test]
    fn test_create_node_with_explicit_layout() {
        let mut store = store();
        let id = store
            .create_node_with(NodeId::from("m"), "MERGE", 3, 1, Point2D::default(), json!({"k": 1}))
            .unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!((node.input_count(), node.output_count()), (3, 1));
        assert_eq!(node.config, json!({"k": 1}));
    }

    #[test]
    fn test_create_node_with_rejects_oversized_layout() {
        let mut store = store();
        let err = store
            .create_node_with(NodeId::from("m"), "MERGE", u32::MAX, u32::MAX, Point2D::default(), json!(null))
            .unwrap_err();

        assert!(matches!(err, CoreError::TooManySockets { .. }));
        assert_eq!(store.node_count(), 0);
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn test_create_node_rejects_unknown_type() {
        let mut store = store();
        let err = store.create_node("BLUR", Point2D::default()).unwrap_err();
        assert_eq!(err, CoreError::UnknownNodeType("BLUR".to_string()));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_insert_duplicate_node_fails() {
        let mut store = store();
        add(&mut store, "a", "TRANSFORM", 1, 1);
        let err = store
            .insert_node(Node::new(NodeId::from("a"), "TRANSFORM", 1, 1, Point2D::default()).unwrap())
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateNodeId(NodeId::from("a")));
    }

    #[test]
    fn test_remove_node_cascades_to_incident_edges() {
        let mut store = store();
        let s = add(&mut store, "s", "SOURCE", 0, 1);
        let t = add(&mut store, "t", "TRANSFORM", 1, 1);
        let k = add(&mut store, "k", "SINK", 1, 0);
        store.connect(SocketAddress::new(s.clone(), 0), SocketAddress::new(t.clone(), 0)).unwrap();
        store.connect(SocketAddress::new(t.clone(), 1), SocketAddress::new(k.clone(), 0)).unwrap();
        store
            .insert_edge(Edge::new(
                EdgeId::from("dangling"),
                SocketAddress::new(s.clone(), 0),
                SocketAddress::new(t.clone(), 0),
            ))
            .unwrap();

        let before = store.edge_count();
        store.remove_node(&t).unwrap();

        assert_eq!(store.edge_count(), before - 3);
        assert!(store.edges().all(|edge| !edge.touches(&t)));
        assert!(store.node(&s).unwrap().incident_edges().is_empty());
        assert!(!store.node(&k).unwrap().socket(0).unwrap().is_connected());
        store.validate_integrity().unwrap();
    }

    #[test]
    fn test_remove_node_emits_edge_removals_before_node_removal() {
        let mut store = store();
        let s = add(&mut store, "s", "SOURCE", 0, 1);
        let t = add(&mut store, "t", "SINK", 1, 0);
        let edge = store.connect(SocketAddress::new(s.clone(), 0), SocketAddress::new(t.clone(), 0)).unwrap();
        store.take_events();

        store.remove_node(&s).unwrap();

        assert_eq!(
            store.take_events(),
            vec![
                GraphEvent::EdgeRemoved {
                    edge,
                    from: SocketAddress::new(s.clone(), 0),
                    to: SocketAddress::new(t, 0),
                },
                GraphEvent::NodeRemoved { node: s },
            ]
        );
    }

    #[test]
    fn test_move_and_config_events() {
        let mut store = store();
        let a = add(&mut store, "a", "TRANSFORM", 1, 1);
        store.take_events();

        store.move_node(&a, Point2D::new(3.0, 4.0)).unwrap();
        store.set_node_config(&a, json!({"script": "x * 2"})).unwrap();

        assert_eq!(
            store.take_events(),
            vec![
                GraphEvent::NodeMoved {
                    node: a.clone(),
                    old: Point2D::default(),
                    new: Point2D::new(3.0, 4.0),
                },
                GraphEvent::NodeConfigChanged { node: a.clone() },
            ]
        );
        assert_eq!(store.node(&a).unwrap().config, json!({"script": "x * 2"}));
        assert!(store.move_node(&NodeId::from("missing"), Point2D::default()).is_err());
    }

    #[test]
    fn test_clear_emits_batched_removals() {
        let mut store = store();
        let s = add(&mut store, "s", "SOURCE", 0, 1);
        let t = add(&mut store, "t", "SINK", 1, 0);
        store.connect(SocketAddress::new(s, 0), SocketAddress::new(t, 0)).unwrap();
        store.take_events();

        store.clear();
        let events = store.take_events();

        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![
                "graph.batch_begin",
                "graph.edge_removed",
                "graph.node_removed",
                "graph.node_removed",
                "graph.cleared",
                "graph.batch_end",
            ]
        );
        assert_eq!(store.stats(), GraphStats::default());
    }

    #[test]
    fn test_nested_batches_emit_one_pair() {
        let mut store = store();
        store.begin_batch();
        store.begin_batch();
        add(&mut store, "a", "SOURCE", 0, 1);
        store.end_batch();
        assert!(store.in_batch());
        store.end_batch();
        store.end_batch();

        let types: Vec<_> = store.take_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["graph.batch_begin", "graph.node_added", "graph.batch_end"]);
    }

    #[test]
    fn test_abort_batch_discards_events() {
        let mut store = store();
        add(&mut store, "a", "SOURCE", 0, 1);

        let mark = store.event_mark();
        store.begin_batch();
        let b = add(&mut store, "b", "SINK", 1, 0);
        store.remove_node(&b).unwrap();
        store.abort_batch(mark);

        assert!(!store.in_batch());
        assert_eq!(
            store.take_events(),
            vec![GraphEvent::NodeAdded { node: NodeId::from("a") }]
        );
    }

    #[test]
    fn test_queries() {
        let mut store = store();
        let s = add(&mut store, "s", "SPLIT", 1, 2);
        let a = add(&mut store, "a", "SINK", 1, 0);
        let b = add(&mut store, "b", "SINK", 1, 0);
        store.connect(SocketAddress::new(s.clone(), 2), SocketAddress::new(b.clone(), 0)).unwrap();
        store.connect(SocketAddress::new(s.clone(), 1), SocketAddress::new(a.clone(), 0)).unwrap();

        assert_eq!(store.node_ids(), vec![a.clone(), b.clone(), s.clone()]);
        let outgoing: Vec<_> = store.outgoing_edges(&s).iter().map(|e| e.from.index).collect();
        assert_eq!(outgoing, vec![1, 2]);
        assert_eq!(store.downstream_nodes(&s), BTreeSet::from([a.clone(), b.clone()]));
        assert_eq!(store.upstream_nodes(&a), BTreeSet::from([s.clone()]));
        assert!(store.incoming_edges(&s).is_empty());
        assert_eq!(store.stats().resolved_edge_count, 2);
    }
}
