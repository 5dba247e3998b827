use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of a socket within its owning node
pub type SocketIndex = u32;

/// Node ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new_v4() -> Self {
        NodeId(Uuid::new_v4().to_string())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// Edge ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new_v4() -> Self {
        EdgeId(Uuid::new_v4().to_string())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        EdgeId(value.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        EdgeId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(NodeId::new_v4(), NodeId::new_v4());
        assert_ne!(EdgeId::new_v4(), EdgeId::new_v4());
    }

    #[test]
    fn test_ids_serialize_transparently_as_tuple_struct() {
        let id = NodeId::from("blur-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"blur-1\"");
        assert_eq!(id.to_string(), "blur-1");
    }
}
