//! Deterministic `context_hash` computation (spec.md §3 `AuditEvent`, §9
//! "Context hash").

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sort object keys so two structurally-equal values serialize
/// identically regardless of insertion order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(String, Value)> =
                map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Build a deterministic `"sha256:" + hex` fingerprint over the sort-keyed
/// canonical JSON projection of `value`.
///
/// Callers are responsible for excluding `timestamp` and `context_hash`
/// itself from the projection before calling this (spec.md §3: "computed
/// over ... everything except `timestamp` and `context_hash` itself").
#[must_use]
pub fn context_hash(value: &Value) -> String {
    let canonical = canonicalize(value);
    // serde_json's compact writer already emits keys in the `Value::Object`
    // iteration order, which we've just sorted above.
    let encoded = serde_json::to_vec(&canonical).expect("canonicalized JSON always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    format!("sha256:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stable_across_key_order() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(context_hash(&a), context_hash(&b));
    }

    #[test]
    fn differs_on_content_change() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(context_hash(&a), context_hash(&b));
    }

    #[test]
    fn has_sha256_prefix_and_64_hex_chars() {
        let h = context_hash(&json!({"x": 1}));
        let suffix = h.strip_prefix("sha256:").expect("prefix");
        assert_eq!(suffix.len(), 64);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
