use nodeflow_core::NodeId;
use std::collections::HashMap;
use std::fmt;

use crate::result::ExecutionResult;

/// Memoization key: node, configuration hash and input hash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Node the result belongs to
    pub node: NodeId,
    /// Execution hash of the node's configuration
    pub config_hash: String,
    /// Hash of the sorted inputs
    pub input_hash: String,
}

impl CacheKey {
    /// Build a key
    pub fn new(node: NodeId, config_hash: String, input_hash: String) -> Self {
        Self {
            node,
            config_hash,
            input_hash,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.node, self.config_hash, self.input_hash)
    }
}

/// Successful results keyed by [`CacheKey`], grouped by node so a node's
/// entries can be dropped without touching anyone else's
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<NodeId, HashMap<CacheKey, ExecutionResult>>,
}

impl MemoCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a result
    pub fn get(&self, key: &CacheKey) -> Option<&ExecutionResult> {
        self.entries.get(&key.node).and_then(|by_key| by_key.get(key))
    }

    /// Store a result
    pub fn insert(&mut self, key: CacheKey, result: ExecutionResult) {
        self.entries
            .entry(key.node.clone())
            .or_default()
            .insert(key, result);
    }

    /// Drop every entry for `node`, returning how many were removed
    pub fn invalidate_node(&mut self, node: &NodeId) -> usize {
        self.entries.remove(node).map_or(0, |by_key| by_key.len())
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
