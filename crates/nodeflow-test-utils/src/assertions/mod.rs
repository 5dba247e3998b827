//! Assertion utilities for validating Nodeflow data structures.

mod graph;

pub use graph::*;
