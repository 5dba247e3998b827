use nodeflow_core::{CoreError, EdgeId, NodeId, SocketIndex};
use std::fmt;
use thiserror::Error;

use crate::validation::ValidationError;

/// All possible errors that can occur while loading a graph description
#[derive(Error, Debug)]
pub enum LoadError {
    /// Errors that occur during JSON parsing
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors that occur during YAML parsing
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading the description failed
    #[error("I/O error: {0}")]
    Io(String),

    /// The file extension does not name a known format
    #[error("Unsupported description format: {0}")]
    UnsupportedFormat(String),

    /// A single validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Multiple validation errors
    #[error("{}", MultipleErrorsFormat(.0))]
    MultipleValidationErrors(Vec<ValidationError>),

    /// Two edges in the description claim the same socket
    #[error("Socket {socket} on node {node} is claimed by both edge {first_edge} and edge {second_edge}")]
    SocketConflict {
        /// Node owning the contested socket
        node: NodeId,
        /// Contested socket index
        socket: SocketIndex,
        /// Edge that claimed the socket first
        first_edge: EdgeId,
        /// Edge that claimed it again
        second_edge: EdgeId,
    },

    /// Creating validated elements failed; the store was rolled back
    #[error("Materialization failed: {0}")]
    Materialization(#[from] CoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// Helper struct to format multiple errors
struct MultipleErrorsFormat<'a>(&'a [ValidationError]);

impl fmt::Display for MultipleErrorsFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors ({} issues):", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, err)?;
        }
        Ok(())
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

impl LoadError {
    /// Create a LoadError from a vector of validation errors
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        let mut errors = errors;
        match errors.len() {
            0 => LoadError::Internal("Called from_validation_errors with empty vector".to_string()),
            1 => LoadError::Validation(errors.remove(0)),
            _ => LoadError::MultipleValidationErrors(errors),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            LoadError::Json(_) => "ERR_LOAD_JSON_PARSE",
            LoadError::Yaml(_) => "ERR_LOAD_YAML_PARSE",
            LoadError::Io(_) => "ERR_LOAD_IO",
            LoadError::UnsupportedFormat(_) => "ERR_LOAD_UNSUPPORTED_FORMAT",
            LoadError::Validation(err) => err.code,
            LoadError::MultipleValidationErrors(_) => "ERR_LOAD_VALIDATION_MULTIPLE",
            LoadError::SocketConflict { .. } => "ERR_LOAD_SOCKET_CONFLICT",
            LoadError::Materialization(_) => "ERR_LOAD_MATERIALIZATION",
            LoadError::Internal(_) => "ERR_LOAD_INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error_codes;

    fn validation_error(message: &str) -> ValidationError {
        ValidationError {
            code: error_codes::MISSING_REQUIRED_FIELD,
            message: message.to_string(),
            path: Some("nodes[0]".to_string()),
        }
    }

    #[test]
    fn test_from_validation_errors() {
        let single = LoadError::from_validation_errors(vec![validation_error("missing id")]);
        assert_eq!(single.error_code(), error_codes::MISSING_REQUIRED_FIELD);

        let multiple = LoadError::from_validation_errors(vec![
            validation_error("missing id"),
            validation_error("missing type"),
        ]);
        assert_eq!(multiple.error_code(), "ERR_LOAD_VALIDATION_MULTIPLE");
        assert!(multiple.to_string().starts_with("Multiple validation errors (2 issues):"));

        let empty = LoadError::from_validation_errors(Vec::new());
        assert_eq!(empty.error_code(), "ERR_LOAD_INTERNAL");
    }

    #[test]
    fn test_conflict_display_names_both_edges() {
        let err = LoadError::SocketConflict {
            node: NodeId::from("T"),
            socket: 0,
            first_edge: EdgeId::from("e1"),
            second_edge: EdgeId::from("e2"),
        };
        assert_eq!(
            err.to_string(),
            "Socket 0 on node T is claimed by both edge e1 and edge e2"
        );
    }
}
