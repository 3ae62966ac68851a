//! Canonical JSON encoding for deterministic signing.
//!
//! Signed payloads are serialized with these rules:
//! - Object keys sorted lexicographically by their UTF-8 bytes, recursively
//! - No whitespace (`,` and `:` separators only)
//! - Strings escaped exactly as `serde_json` escapes them (non-ASCII kept raw)
//! - Numbers rendered by `serde_json` (floats keep a fractional part: `1.0`)
//! - Array order preserved
//!
//! **CRITICAL**: This encoding is FROZEN. Changing it, or changing which
//! fields a payload includes, breaks every existing signature.

use serde::Serialize;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Version of the signed payload schema. Participates in every payload.
pub const SCHEMA_VERSION: u64 = 2;

/// Payload key carrying the schema version.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Payload key carrying the entity kind.
pub const KIND_KEY: &str = "kind";

/// Canonicalize a JSON value into its signable string form.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Serialize any value to JSON and canonicalize it.
pub fn canonicalize_serialize<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(canonicalize(&value))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, val);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&Value::String(s.to_owned()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_sorts_keys() {
        let value = json!({"b": 1, "a": 2, "c": {"z": true, "y": null}});
        assert_eq!(
            canonicalize(&value),
            r#"{"a":2,"b":1,"c":{"y":null,"z":true}}"#
        );
    }

    #[test]
    fn test_canonical_permutation_invariant() {
        let a: Value =
            serde_json::from_str(r#"{"content":"x","confidence":0.8,"tags":[1,2]}"#).unwrap();
        let b: Value =
            serde_json::from_str(r#"{"tags":[1,2],"confidence":0.8,"content":"x"}"#).unwrap();
        assert_eq!(canonicalize(&a), canonicalize(&b));
    }

    #[test]
    fn test_canonical_preserves_array_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonicalize(&value), "[3,1,2]");
    }

    #[test]
    fn test_canonical_float_rendering() {
        let value = json!({"x": 0.5, "y": 1.0, "z": 3});
        assert_eq!(canonicalize(&value), r#"{"x":0.5,"y":1.0,"z":3}"#);
    }

    #[test]
    fn test_canonical_escapes_strings() {
        let value = json!({"q": "say \"hi\"\n", "u": "café"});
        assert_eq!(canonicalize(&value), r#"{"q":"say \"hi\"\n","u":"café"}"#);
    }

    #[test]
    fn test_nested_arrays_of_objects_sorted() {
        let value = json!([{"b": 1, "a": 0}]);
        assert_eq!(canonicalize(&value), r#"[{"a":0,"b":1}]"#);
    }
}
