//! Upstream/downstream adjacency derived from the graph store.

use nodeflow_core::{GraphStore, NodeId};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::capability::ExecutableCapability;

/// Result of ordering the dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologicalOrder {
    /// Every node not on a cycle, upstream before downstream
    pub order: Vec<NodeId>,
    /// Nodes found on a cycle, excluded from `order`
    pub cyclic: BTreeSet<NodeId>,
}

/// Dependency graph over nodes
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    deps: HashMap<NodeId, BTreeSet<NodeId>>,
    dependents: HashMap<NodeId, BTreeSet<NodeId>>,
    dirty: bool,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Create an empty graph that needs a rebuild
    pub fn new() -> Self {
        Self {
            deps: HashMap::new(),
            dependents: HashMap::new(),
            dirty: true,
        }
    }

    /// Flag the graph as stale
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the graph is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild from the store's resolved edges plus the capability's declared dependencies
    pub fn rebuild(&mut self, store: &GraphStore, capability: &dyn ExecutableCapability) {
        self.deps.clear();
        self.dependents.clear();

        let nodes = store.node_ids();
        for node in &nodes {
            self.deps.entry(node.clone()).or_default();
            self.dependents.entry(node.clone()).or_default();
        }

        for edge in store.resolved_edges() {
            self.add_dependency(edge.from.node.clone(), edge.to.node.clone());
        }

        for node in &nodes {
            for upstream in capability.dependencies(node) {
                if &upstream != node && store.contains_node(&upstream) {
                    self.add_dependency(upstream, node.clone());
                }
            }
        }

        self.dirty = false;
        debug!(nodes = nodes.len(), "Rebuilt dependency graph");
    }

    /// Record that `downstream` depends on `upstream`
    pub fn add_dependency(&mut self, upstream: NodeId, downstream: NodeId) {
        self.deps.entry(upstream.clone()).or_default();
        self.dependents.entry(downstream.clone()).or_default();
        self.dependents
            .entry(upstream.clone())
            .or_default()
            .insert(downstream.clone());
        self.deps.entry(downstream).or_default().insert(upstream);
    }

    /// Direct upstream dependencies of `node`
    pub fn upstream(&self, node: &NodeId) -> BTreeSet<NodeId> {
        self.deps.get(node).cloned().unwrap_or_default()
    }

    /// Direct dependents of `node`
    pub fn downstream(&self, node: &NodeId) -> BTreeSet<NodeId> {
        self.dependents.get(node).cloned().unwrap_or_default()
    }

    /// Every node transitively downstream of `node`, found breadth first.
    /// `node` itself is only included when it sits on a cycle.
    pub fn downstream_closure(&self, node: &NodeId) -> BTreeSet<NodeId> {
        let mut found = BTreeSet::new();
        let mut queue: VecDeque<&NodeId> = VecDeque::new();
        queue.push_back(node);

        while let Some(current) = queue.pop_front() {
            if let Some(next) = self.dependents.get(current) {
                for dependent in next {
                    if found.insert(dependent.clone()) {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        found
    }

    /// Order nodes so every node follows its upstream dependencies.
    ///
    /// Depth first over upstream links, appending a node once all of its
    /// dependencies are appended. A dependency already on the recursion
    /// stack closes a cycle; every node on it is reported and left out.
    pub fn topological_order(&self) -> TopologicalOrder {
        let mut starts: Vec<&NodeId> = self.deps.keys().collect();
        starts.sort();

        let mut visited = HashSet::with_capacity(starts.len());
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();
        let mut order = Vec::with_capacity(starts.len());
        let mut cyclic = BTreeSet::new();

        for node in starts {
            self.visit(node, &mut visited, &mut rec_stack, &mut path, &mut order, &mut cyclic);
        }

        if !cyclic.is_empty() {
            warn!(cyclic = ?cyclic, "Cycle detected in dependency graph, excluding cyclic nodes");
            order.retain(|node| !cyclic.contains(node));
        }

        TopologicalOrder { order, cyclic }
    }

    fn visit<'a>(
        &'a self,
        node: &'a NodeId,
        visited: &mut HashSet<&'a NodeId>,
        rec_stack: &mut HashSet<&'a NodeId>,
        path: &mut Vec<&'a NodeId>,
        order: &mut Vec<NodeId>,
        cyclic: &mut BTreeSet<NodeId>,
    ) {
        if rec_stack.contains(node) {
            if let Some(start) = path.iter().position(|n| *n == node) {
                cyclic.extend(path[start..].iter().map(|n| (*n).clone()));
            }
            return;
        }
        if !visited.insert(node) {
            return;
        }

        rec_stack.insert(node);
        path.push(node);

        if let Some(deps) = self.deps.get(node) {
            for dep in deps {
                self.visit(dep, visited, rec_stack, path, order, cyclic);
            }
        }

        path.pop();
        rec_stack.remove(node);
        order.push(node.clone());
    }
}
