//! # Nodeflow Loader
//!
//! Turns serialized graph descriptions into live topology inside a
//! [`nodeflow_core::GraphStore`], with all-or-nothing guarantees.
//!
//! ## Features
//!
//! * JSON and YAML descriptions with camelCase element fields
//! * Validation of every element before any mutation
//! * Detection of sockets claimed by two edges before any mutation
//! * Partial-success reporting for edges that fail to resolve
//! * Export of a store back into a description
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use nodeflow_core::{GraphStore, NodeTypeRegistry};
//! use nodeflow_loader::GraphLoader;
//!
//! let mut store = GraphStore::new(Arc::new(NodeTypeRegistry::with_builtin_types()));
//! let yaml = r#"
//! nodes:
//!   - { id: S, type: SOURCE, inputs: 0, outputs: 1 }
//!   - { id: T, type: SINK, inputs: 1, outputs: 0 }
//! edges:
//!   - { id: e1, fromNode: S, fromSocketIndex: 0, toNode: T, toSocketIndex: 0 }
//! "#;
//!
//! let report = GraphLoader::new().load_yaml(&mut store, yaml).unwrap();
//! assert_eq!(report.edges_resolved, 1);
//! ```

mod error;

pub mod description;
pub mod export;
pub mod loader;
pub mod validation;

pub use description::{DescriptionFormat, EdgeElement, GraphDescription, NodeElement};
pub use error::LoadError;
pub use export::export_description;
pub use loader::{GraphLoader, LoadPlan, LoadReport, UnresolvedEdge};
pub use validation::{ValidationError, Validator};
