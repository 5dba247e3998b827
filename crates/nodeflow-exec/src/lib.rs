//!
//! Nodeflow Exec - incremental execution of Nodeflow graphs
//!
//! The [`ExecutionOrchestrator`] derives a dependency graph from the store's
//! resolved edges, runs nodes in dependency order through an
//! [`ExecutableCapability`], memoizes successful results and invalidates
//! exactly what a graph change can affect. [`GraphEngine`] owns the store
//! and the orchestrator behind a single lock and drives debounced batch
//! execution.
//!
//! ```no_run
//! use nodeflow_core::{NodeTypeRegistry, Point2D};
//! use nodeflow_exec::{EngineConfig, GraphEngine, NoopCapability};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), nodeflow_exec::EngineError> {
//! let engine = GraphEngine::new(
//!     Arc::new(NodeTypeRegistry::with_builtin_types()),
//!     Arc::new(NoopCapability),
//!     EngineConfig::load(),
//! );
//! let source = engine.create_node("SOURCE", Point2D::default()).await?;
//! let sink = engine.create_node("SINK", Point2D::new(200.0, 0.0)).await?;
//! engine.connect(&source, 0, &sink, 0).await?;
//!
//! let report = engine.execute_all().await?;
//! println!("executed {} nodes", report.executed.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Memoization cache
pub mod cache;

/// The executable capability seam
pub mod capability;

/// Engine configuration
pub mod config;

/// Derived dependency graph and ordering
pub mod dependency;

/// The lock-owning graph engine
pub mod engine;

/// Error types
pub mod error;

/// Execution notifications
pub mod events;

/// Execution orchestrator
pub mod orchestrator;

/// Execution results and statistics
pub mod result;

/// Debounced batch scheduling
pub mod scheduler;

pub use cache::{CacheKey, MemoCache};
pub use capability::{ExecutableCapability, NoopCapability};
pub use config::EngineConfig;
pub use dependency::{DependencyGraph, TopologicalOrder};
pub use engine::GraphEngine;
pub use error::{CapabilityError, EngineError, EngineResult};
pub use events::{ExecutionEvent, ExecutionObserver};
pub use orchestrator::ExecutionOrchestrator;
pub use result::{ExecutionReport, ExecutionResult, ExecutionStats, NodeExecutionState};
pub use scheduler::DebounceScheduler;
