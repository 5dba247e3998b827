use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Declared shape of a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    /// Type tag
    pub kind: String,

    /// Default number of input sockets
    pub inputs: u32,

    /// Default number of output sockets
    pub outputs: u32,

    /// Configuration given to new nodes of this type
    #[serde(default)]
    pub default_config: Value,
}

impl NodeTypeSpec {
    /// Create a type with the given socket counts and no default configuration
    pub fn new(kind: impl Into<String>, inputs: u32, outputs: u32) -> Self {
        Self {
            kind: kind.into(),
            inputs,
            outputs,
            default_config: Value::Null,
        }
    }
}

/// Registry of known node types.
///
/// Built once at startup and shared through an `Arc` with every component
/// that creates or validates nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    types: HashMap<String, NodeTypeSpec>,
}

impl NodeTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the builtin types
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        for spec in [
            NodeTypeSpec::new("SOURCE", 0, 1),
            NodeTypeSpec::new("SINK", 1, 0),
            NodeTypeSpec::new("SPLIT", 1, 2),
            NodeTypeSpec::new("MERGE", 2, 1),
            NodeTypeSpec::new("TRANSFORM", 1, 1),
        ] {
            registry.register(spec);
        }
        registry
    }

    /// Register a type, replacing any previous registration with the same tag
    pub fn register(&mut self, spec: NodeTypeSpec) -> Option<NodeTypeSpec> {
        self.types.insert(spec.kind.clone(), spec)
    }

    /// Remove a type
    pub fn unregister(&mut self, kind: &str) -> Option<NodeTypeSpec> {
        self.types.remove(kind)
    }

    /// Whether a type is registered
    pub fn contains(&self, kind: &str) -> bool {
        self.types.contains_key(kind)
    }

    /// Look up a type
    pub fn get(&self, kind: &str) -> Option<&NodeTypeSpec> {
        self.types.get(kind)
    }

    /// Registered type tags, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.types.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
