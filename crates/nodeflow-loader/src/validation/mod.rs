use nodeflow_core::GraphStore;
use std::error::Error;
use std::fmt;

use crate::description::GraphDescription;
use crate::error::LoadError;

mod conflicts;
mod edge_validator;
mod node_validator;

pub use conflicts::detect_socket_conflicts;
pub use edge_validator::EdgeElementValidator;
pub use node_validator::NodeElementValidator;

/// Represents a validation error found in a graph description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error code (should be a constant identifier)
    pub code: &'static str,

    /// Human-readable error message
    pub message: String,

    /// Optional path to the offending element (e.g., "edges[2].toNode")
    pub path: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl Error for ValidationError {}

/// Validation error codes
pub mod error_codes {
    /// Missing required field
    pub const MISSING_REQUIRED_FIELD: &str = "ERR_LOAD_VALIDATION_MISSING_REQUIRED_FIELD";

    /// Node type is not registered
    pub const UNKNOWN_NODE_TYPE: &str = "ERR_LOAD_VALIDATION_UNKNOWN_NODE_TYPE";

    /// Socket count or index is negative or too large
    pub const INVALID_VALUE: &str = "ERR_LOAD_VALIDATION_INVALID_VALUE";

    /// Duplicate ID within the description
    pub const DUPLICATE_ID: &str = "ERR_LOAD_VALIDATION_DUPLICATE_ID";

    /// ID already used by an element in the store
    pub const ID_IN_USE: &str = "ERR_LOAD_VALIDATION_ID_IN_USE";

    /// Edge endpoint names a node that is neither described nor stored
    pub const INVALID_REFERENCE: &str = "ERR_LOAD_VALIDATION_INVALID_REFERENCE";
}

/// A validator that checks one aspect of a description against the live store
pub trait Validator {
    /// Validate the description and return every problem found
    fn validate(&self, description: &GraphDescription, store: &GraphStore) -> Vec<ValidationError>;
}

/// Run every validator without touching the store
pub fn validate_description(description: &GraphDescription, store: &GraphStore) -> Result<(), LoadError> {
    let validators: Vec<Box<dyn Validator>> = vec![
        Box::new(NodeElementValidator::new()),
        Box::new(EdgeElementValidator::new()),
    ];

    let mut errors = Vec::new();
    for validator in validators {
        errors.extend(validator.validate(description, store));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::from_validation_errors(errors))
    }
}

pub(crate) fn missing(field: &str, path: String) -> ValidationError {
    ValidationError {
        code: error_codes::MISSING_REQUIRED_FIELD,
        message: format!("Missing required field '{}'", field),
        path: Some(path),
    }
}

/// Accept a socket count or index that fits a `u32`
pub(crate) fn socket_number(
    value: i64,
    field: &str,
    path: String,
) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError {
        code: error_codes::INVALID_VALUE,
        message: format!("Field '{}' must be a non-negative integer, got {}", field, value),
        path: Some(path),
    })
}
