//! All-or-nothing loading of a description into a live [`GraphStore`].
//!
//! Loading runs in three phases:
//!
//! 1. Validate every element and scan the edges for sockets claimed twice.
//!    Nothing in the store is touched yet.
//! 2. Create the nodes, then the edges in unresolved form. A failure here
//!    undoes everything created so far.
//! 3. Resolve each edge. A failure at this point leaves that edge
//!    unresolved and is reported as a warning.
//!
//! Phases 2 and 3 run inside a store batch so observers react once.

use nodeflow_core::{Edge, EdgeId, GraphStore, Node, NodeId, Point2D, SocketAddress};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::description::GraphDescription;
use crate::error::LoadError;
use crate::validation::{detect_socket_conflicts, validate_description};

/// An edge left unresolved by a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEdge {
    /// The edge
    pub edge: EdgeId,
    /// Why it could not be resolved
    pub reason: String,
}

/// Outcome of a successful load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Nodes created
    pub nodes_created: Vec<NodeId>,
    /// Edges created, resolved or not
    pub edges_created: Vec<EdgeId>,
    /// Number of edges bound to sockets
    pub edges_resolved: usize,
    /// Edges that stayed unresolved
    pub unresolved: Vec<UnresolvedEdge>,
}

impl LoadReport {
    /// Whether every created edge was resolved
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Validated elements ready to be materialized
#[derive(Debug, Clone, Default)]
pub struct LoadPlan {
    /// Nodes in description order
    pub nodes: Vec<Node>,
    /// Unresolved edges in description order
    pub edges: Vec<Edge>,
}

impl LoadPlan {
    /// Convert a description that already passed validation
    pub fn from_description(description: &GraphDescription, store: &GraphStore) -> Result<Self, LoadError> {
        let mut plan = LoadPlan::default();

        for (i, element) in description.nodes.iter().enumerate() {
            let (Some(id), Some(kind), Some(inputs), Some(outputs)) =
                (&element.id, &element.kind, element.inputs, element.outputs)
            else {
                return Err(unvalidated(format!("nodes[{}]", i)));
            };
            let inputs = u32::try_from(inputs).map_err(|_| unvalidated(format!("nodes[{}].inputs", i)))?;
            let outputs = u32::try_from(outputs).map_err(|_| unvalidated(format!("nodes[{}].outputs", i)))?;

            let config = if element.config.is_null() {
                store
                    .registry()
                    .get(kind)
                    .map(|spec| spec.default_config.clone())
                    .unwrap_or(Value::Null)
            } else {
                element.config.clone()
            };
            let position = Point2D::new(element.x.unwrap_or_default(), element.y.unwrap_or_default());

            plan.nodes.push(
                Node::new(NodeId::from(id.as_str()), kind.as_str(), inputs, outputs, position)?
                    .with_config(config),
            );
        }

        for (i, element) in description.edges.iter().enumerate() {
            let (Some(id), Some(from_node), Some(from_index), Some(to_node), Some(to_index)) = (
                &element.id,
                &element.from_node,
                element.from_socket_index,
                &element.to_node,
                element.to_socket_index,
            ) else {
                return Err(unvalidated(format!("edges[{}]", i)));
            };
            let from_index =
                u32::try_from(from_index).map_err(|_| unvalidated(format!("edges[{}].fromSocketIndex", i)))?;
            let to_index =
                u32::try_from(to_index).map_err(|_| unvalidated(format!("edges[{}].toSocketIndex", i)))?;

            plan.edges.push(Edge::new(
                EdgeId::from(id.as_str()),
                SocketAddress::new(from_node.as_str(), from_index),
                SocketAddress::new(to_node.as_str(), to_index),
            ));
        }

        Ok(plan)
    }
}

fn unvalidated(path: String) -> LoadError {
    LoadError::Internal(format!("Element {} reached planning without passing validation", path))
}

#[derive(Default)]
struct Created {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
}

/// Loads graph descriptions into a store
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {}

impl GraphLoader {
    /// Create a loader
    pub fn new() -> Self {
        GraphLoader {}
    }

    /// Load `description` into `store`, all or nothing
    pub fn load(&self, store: &mut GraphStore, description: &GraphDescription) -> Result<LoadReport, LoadError> {
        info!(
            nodes = description.nodes.len(),
            edges = description.edges.len(),
            "Loading graph description"
        );

        validate_description(description, store)?;
        let plan = LoadPlan::from_description(description, store)?;
        detect_socket_conflicts(&plan.edges)?;

        let mark = store.event_mark();
        store.begin_batch();

        let mut created = Created::default();
        if let Err(e) = Self::materialize(store, &plan, &mut created) {
            warn!(error = %e, "Materialization failed, rolling back");
            Self::rollback(store, &created, mark);
            return Err(e);
        }

        let mut report = LoadReport {
            nodes_created: created.nodes,
            edges_created: created.edges,
            ..Default::default()
        };

        for edge in &plan.edges {
            match store.resolve_edge(&edge.id) {
                Ok(_) => report.edges_resolved += 1,
                Err(e) => {
                    warn!(edge_id = %edge.id, error = %e, "Edge left unresolved");
                    report.unresolved.push(UnresolvedEdge {
                        edge: edge.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        store.end_batch();

        info!(
            nodes_created = report.nodes_created.len(),
            edges_created = report.edges_created.len(),
            edges_resolved = report.edges_resolved,
            unresolved = report.unresolved.len(),
            "Graph description loaded"
        );
        Ok(report)
    }

    /// Parse JSON and load it
    pub fn load_json(&self, store: &mut GraphStore, content: &str) -> Result<LoadReport, LoadError> {
        let description = GraphDescription::from_json(content)?;
        self.load(store, &description)
    }

    /// Parse YAML and load it
    pub fn load_yaml(&self, store: &mut GraphStore, content: &str) -> Result<LoadReport, LoadError> {
        let description = GraphDescription::from_yaml(content)?;
        self.load(store, &description)
    }

    fn materialize(store: &mut GraphStore, plan: &LoadPlan, created: &mut Created) -> Result<(), LoadError> {
        for node in &plan.nodes {
            let id = store.insert_node(node.clone())?;
            debug!(node_id = %id, "Materialized node");
            created.nodes.push(id);
        }
        for edge in &plan.edges {
            let id = store.insert_edge(edge.clone())?;
            debug!(edge_id = %id, "Materialized edge");
            created.edges.push(id);
        }
        Ok(())
    }

    fn rollback(store: &mut GraphStore, created: &Created, mark: usize) {
        for id in created.edges.iter().rev() {
            if let Err(e) = store.remove_edge(id) {
                warn!(edge_id = %id, error = %e, "Failed to roll back edge");
            }
        }
        for id in created.nodes.iter().rev() {
            if let Err(e) = store.remove_node(id) {
                warn!(node_id = %id, error = %e, "Failed to roll back node");
            }
        }
        store.abort_batch(mark);
    }
}
