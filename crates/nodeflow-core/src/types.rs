use serde_json::Value;
use std::collections::HashMap;

/// Named values flowing into or out of a node.
///
/// Inputs are keyed `input_<socket index>`, outputs `output_<socket index>`.
pub type PortValues = HashMap<String, Value>;

/// Key under which a node publishes the value of output socket `index`
pub fn output_key(index: u32) -> String {
    format!("output_{}", index)
}

/// Key under which a node receives the value of input socket `index`
pub fn input_key(index: u32) -> String {
    format!("input_{}", index)
}
