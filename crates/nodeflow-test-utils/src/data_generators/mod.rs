//! Test data generators for Nodeflow.
//!
//! Builders and canned documents for graph descriptions.

mod descriptions;

pub use descriptions::*;
