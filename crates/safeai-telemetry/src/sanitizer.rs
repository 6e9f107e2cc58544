//! `MetadataSanitizer` (spec component C18, spec.md §4.0b "Logging
//! (ambient)") — strips likely secrets out of the *outbound copy* of an
//! audit event's metadata before it reaches an external advisory channel.
//! The on-disk audit record itself is never touched.

use std::collections::HashSet;

use serde_json::Value;

use safeai_classifier::Classifier;

const REDACTED: &str = "[REDACTED]";

const DEFAULT_BANNED_KEYS: &[&str] = &["token", "secret", "password", "authorization"];

/// Redacts ban-listed metadata keys and classifier-flagged values.
pub struct MetadataSanitizer {
    banned_keys: HashSet<String>,
    classifier: Classifier,
}

impl MetadataSanitizer {
    /// A sanitizer using the built-in banned-key list and detector
    /// catalogue, plus any caller-supplied additional banned keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier's built-in detector patterns fail
    /// to compile, which would indicate a packaging bug rather than bad
    /// caller input.
    pub fn new(extra_banned_keys: &[String]) -> safeai_core::Result<Self> {
        let mut banned_keys: HashSet<String> =
            DEFAULT_BANNED_KEYS.iter().map(|s| (*s).to_string()).collect();
        banned_keys.extend(extra_banned_keys.iter().map(|k| k.to_lowercase()));
        let classifier = Classifier::new(&[])?;
        Ok(Self { banned_keys, classifier })
    }

    /// Returns a sanitized deep copy of `metadata`. Object keys matching
    /// the banned-key set (case-insensitive) are replaced wholesale;
    /// string values anywhere in the structure that the classifier flags
    /// have their matched spans redacted in place.
    #[must_use]
    pub fn sanitize(&self, metadata: &Value) -> Value {
        self.sanitize_value(metadata, false)
    }

    fn sanitize_value(&self, value: &Value, key_is_banned: bool) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let banned = self.banned_keys.contains(&k.to_lowercase());
                        (k.clone(), self.sanitize_value(v, banned))
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.sanitize_value(v, key_is_banned)).collect())
            }
            Value::String(s) => {
                if key_is_banned {
                    Value::String(REDACTED.to_string())
                } else {
                    Value::String(self.redact_detected_spans(s))
                }
            }
            other => other.clone(),
        }
    }

    fn redact_detected_spans(&self, text: &str) -> String {
        let mut detections = self.classifier.classify(text);
        if detections.is_empty() {
            return text.to_string();
        }
        detections.sort_by_key(safeai_core::Detection::sort_key);
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for detection in &detections {
            if detection.start < cursor {
                continue;
            }
            out.push_str(&text[cursor..detection.start]);
            out.push_str(REDACTED);
            cursor = detection.end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn redacts_banned_keys_wholesale() {
        let sanitizer = MetadataSanitizer::new(&[]).unwrap();
        let input = json!({"token": "abc123", "note": "fine"});
        let out = sanitizer.sanitize(&input);
        assert_eq!(out["token"], json!("[REDACTED]"));
        assert_eq!(out["note"], json!("fine"));
    }

    #[test]
    fn redacts_case_insensitively_and_nested() {
        let sanitizer = MetadataSanitizer::new(&[]).unwrap();
        let input = json!({"Authorization": {"Bearer": "xyz"}, "list": ["PASSWORD", {"secret": "v"}]});
        let out = sanitizer.sanitize(&input);
        assert_eq!(out["Authorization"]["Bearer"], json!("[REDACTED]"));
        assert_eq!(out["list"][1]["secret"], json!("[REDACTED]"));
    }

    #[test]
    fn redacts_classifier_flagged_values_in_place() {
        let sanitizer = MetadataSanitizer::new(&[]).unwrap();
        let input = json!({"note": "contact me at a@example.com please"});
        let out = sanitizer.sanitize(&input);
        let note = out["note"].as_str().unwrap();
        assert!(note.contains("[REDACTED]"));
        assert!(!note.contains("a@example.com"));
    }

    #[test]
    fn extra_banned_keys_are_respected() {
        let sanitizer = MetadataSanitizer::new(&["internal_id".to_string()]).unwrap();
        let input = json!({"internal_id": "12345"});
        let out = sanitizer.sanitize(&input);
        assert_eq!(out["internal_id"], json!("[REDACTED]"));
    }
}
