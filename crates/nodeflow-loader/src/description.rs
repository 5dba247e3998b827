//! Serialized graph descriptions.
//!
//! A description is a list of node elements and a list of edge elements.
//! Every field is optional at the parsing stage so that a missing field
//! surfaces as a validation error naming the element, rather than as an
//! opaque parse failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::LoadError;

/// Supported encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionFormat {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl DescriptionFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(DescriptionFormat::Json),
            "yaml" | "yml" => Ok(DescriptionFormat::Yaml),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A node element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeElement {
    /// Unique node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Registered type tag
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Horizontal position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    /// Vertical position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    /// Number of input sockets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<i64>,

    /// Number of output sockets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<i64>,

    /// Opaque node configuration
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

/// An edge element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeElement {
    /// Unique edge id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Source node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_node: Option<String>,

    /// Source socket index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_socket_index: Option<i64>,

    /// Target node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_node: Option<String>,

    /// Target socket index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_socket_index: Option<i64>,
}

/// A complete serialized graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Node elements
    #[serde(default)]
    pub nodes: Vec<NodeElement>,

    /// Edge elements
    #[serde(default)]
    pub edges: Vec<EdgeElement>,
}

impl GraphDescription {
    /// Parse a JSON description
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a YAML description
    pub fn from_yaml(content: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a description in the given format
    pub fn parse(content: &str, format: DescriptionFormat) -> Result<Self, LoadError> {
        match format {
            DescriptionFormat::Json => Self::from_json(content),
            DescriptionFormat::Yaml => Self::from_yaml(content),
        }
    }

    /// Read and parse a file, choosing the format from its extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let format = DescriptionFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String, LoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write to a file, choosing the format from its extension
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let content = match DescriptionFormat::from_path(path)? {
            DescriptionFormat::Json => self.to_json()?,
            DescriptionFormat::Yaml => self.to_yaml()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_json_with_camel_case_fields() {
        let json = r#"{
            "nodes": [
                {"id": "S", "type": "SOURCE", "x": 10.0, "y": 20.0, "inputs": 0, "outputs": 1},
                {"id": "T", "type": "SINK", "inputs": 1, "outputs": 0, "config": {"label": "out"}}
            ],
            "edges": [
                {"id": "e1", "fromNode": "S", "fromSocketIndex": 0, "toNode": "T", "toSocketIndex": 0}
            ]
        }"#;

        let description = GraphDescription::from_json(json).unwrap();

        assert_eq!(description.nodes.len(), 2);
        assert_eq!(description.nodes[0].kind.as_deref(), Some("SOURCE"));
        assert_eq!(description.nodes[1].config["label"], "out");
        assert_eq!(
            description.edges[0],
            EdgeElement {
                id: Some("e1".to_string()),
                from_node: Some("S".to_string()),
                from_socket_index: Some(0),
                to_node: Some("T".to_string()),
                to_socket_index: Some(0),
            }
        );
    }

    #[test]
    fn test_parse_yaml_with_missing_fields() {
        let yaml = r#"
nodes:
  - id: A
    type: TRANSFORM
edges:
  - id: e1
    fromNode: A
"#;

        let description = GraphDescription::from_yaml(yaml).unwrap();

        assert_eq!(description.nodes[0].inputs, None);
        assert_eq!(description.edges[0].to_node, None);
    }

    #[test]
    fn test_empty_document_is_an_empty_graph() {
        let description = GraphDescription::from_json("{}").unwrap();
        assert_eq!(description, GraphDescription::default());
    }

    #[test]
    fn test_malformed_input_is_a_parse_error() {
        let err = GraphDescription::from_json("{\"nodes\": [").unwrap_err();
        assert_eq!(err.error_code(), "ERR_LOAD_JSON_PARSE");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DescriptionFormat::from_path(Path::new("graph.YML")).unwrap(),
            DescriptionFormat::Yaml
        );
        assert!(DescriptionFormat::from_path(Path::new("graph.xml")).is_err());
    }
}
