//!
//! Nodeflow Core - graph data model for the Nodeflow engine
//!
//! This crate defines nodes, sockets and edges, the node type registry,
//! the authoritative [`GraphStore`] with its connection resolution rules,
//! and the change notifications other components observe.
//!
//! Nodes and edges never hold references to each other. Every edge names its
//! endpoints by `(NodeId, SocketIndex)` and every traversal goes through the
//! store, so removing a node can never leave a dangling binding behind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - nodes, sockets, edges, registry and events
pub mod domain;

/// The graph store and its resolution rules
pub mod store;

/// Content hashing helpers
pub mod hashing;

/// Core types shared across crates
pub mod types;

/// Error types
pub mod error;

pub use domain::edge::{Edge, ResolvedEdge};
pub use domain::events::{GraphEvent, GraphObserver};
pub use domain::ids::{EdgeId, NodeId, SocketIndex};
pub use domain::node::{Node, Point2D, MAX_SOCKETS};
pub use domain::registry::{NodeTypeRegistry, NodeTypeSpec};
pub use domain::socket::{Socket, SocketAddress, SocketRef, SocketRole};
pub use error::{CoreError, CoreResult, ResolutionError};
pub use store::{GraphStats, GraphStore};
pub use types::PortValues;
