/// Identifier newtypes
pub mod ids;

/// Sockets and socket addressing
pub mod socket;

/// Node aggregate
pub mod node;

/// Edges and their resolution state
pub mod edge;

/// Node type registry
pub mod registry;

/// Change notifications
pub mod events;
