//! Test implementations (fakes) of the Nodeflow collaborator interfaces.
//!
//! These run entirely in memory and expose counters and logs so tests can
//! assert on what the engine asked of them.

pub mod recording_observer;
pub mod scripted_capability;

pub use recording_observer::*;
pub use scripted_capability::*;
