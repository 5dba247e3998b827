//! Nodeflow: typed node graphs with transactional loading and incremental,
//! memoized execution.
//!
//! This crate re-exports the workspace crates and provides the
//! [`PassthroughCapability`] used by the `nodeflow` binary.

#![forbid(unsafe_code)]

pub mod passthrough;

pub use nodeflow_core as core;
pub use nodeflow_exec as exec;
pub use nodeflow_loader as loader;
pub use nodeflow_monitoring as monitoring;

pub use nodeflow_core::{GraphStore, NodeId, NodeTypeRegistry, Point2D};
pub use nodeflow_exec::{EngineConfig, ExecutableCapability, GraphEngine};
pub use nodeflow_loader::{GraphDescription, GraphLoader, LoadReport};
pub use passthrough::PassthroughCapability;
