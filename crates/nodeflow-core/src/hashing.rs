//! Content hashes used for memoization keys.
//!
//! All hashes are SHA-256 rendered as `sha256:<hex>`.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::types::PortValues;

/// Hash raw bytes
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Hash a JSON value by its compact serialization
pub fn hash_value(value: &Value) -> String {
    content_hash(value.to_string().as_bytes())
}

/// Hash a set of named values independently of map iteration order.
///
/// Pairs are sorted by key and encoded as one JSON object, so keys and
/// values are quoted and escaped and distinct maps never share an encoding.
pub fn hash_inputs(inputs: &PortValues) -> String {
    let mut pairs: Vec<(&String, &Value)> = inputs.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let encoded: Map<String, Value> = pairs
        .into_iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    hash_value(&Value::Object(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_hash_format() {
        let hash = content_hash(b"hello");
        assert_eq!(
            hash,
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_input_hash_ignores_insertion_order() {
        let mut a = PortValues::new();
        a.insert("input_0".to_string(), json!(1));
        a.insert("input_1".to_string(), json!("x"));

        let mut b = PortValues::new();
        b.insert("input_1".to_string(), json!("x"));
        b.insert("input_0".to_string(), json!(1));

        assert_eq!(hash_inputs(&a), hash_inputs(&b));

        b.insert("input_0".to_string(), json!(2));
        assert_ne!(hash_inputs(&a), hash_inputs(&b));
    }

    #[test]
    fn test_empty_inputs_hash_is_stable() {
        assert_eq!(hash_inputs(&PortValues::new()), content_hash(b"{}"));
    }

    #[test]
    fn test_hash_inputs_keeps_keys_and_values_apart() {
        let mut plain = PortValues::new();
        plain.insert("a".to_string(), json!(1));
        plain.insert("b".to_string(), json!(2));

        let mut crafted = PortValues::new();
        crafted.insert("a:1|b".to_string(), json!(2));

        assert_ne!(hash_inputs(&plain), hash_inputs(&crafted));
    }
}
