//! Testing utilities for Nodeflow.
//!
//! This crate provides fakes for the collaborator interfaces (a scripted
//! executable capability and a recording observer), builders for graph
//! descriptions, assertion helpers and test tracing setup.

pub mod assertions;
pub mod data_generators;
pub mod implementations;
pub mod logging;

/// Re-export commonly used types for convenience
pub use mockall;

pub use assertions::{assert_precedes, assert_store_invariants, GraphAssertionError};
pub use data_generators::{create_chain_description, create_source_sink_yaml, DescriptionBuilder};
pub use implementations::{Behavior, RecordingObserver, ScriptedCapability};
pub use logging::init_test_tracing;
