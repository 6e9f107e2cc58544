//! Structured scanner (spec component C11, spec.md §4.11): recursively
//! walks a JSON-like value, classifying every leaf string and applying one
//! policy decision over the union of detected tags.
//!
//! Grounded on `original_source/safeai/core/structured_scanner.py`'s
//! `StructuredScanner.scan` (JSONPath-like path building, path→detections
//! map, rebuild-on-redact).

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};

use safeai_audit::{AuditEvent, AuditEventBuilder, AuditLogger};
use safeai_classifier::Classifier;
use safeai_core::{AuditAction, Boundary, Detection, DecisionAction, PolicyDecision};
use safeai_policy::{Engine as PolicyEngine, PolicyContext};

use crate::redact::redact_spans;

/// One leaf string found while walking a structured payload, plus its
/// JSONPath-like location (`$.a.b[2]`) and the detections found in it.
#[derive(Debug, Clone, Serialize)]
pub struct LeafDetections {
    /// Path to this leaf.
    pub path: String,
    /// Detections found in the leaf's string value.
    pub detections: Vec<Detection>,
}

/// Outcome of one [`StructuredScanner::scan`] call.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredScanResult {
    /// The rebuilt payload (`None` on `block`/`require_approval`).
    pub value: Option<Value>,
    /// The policy decision that produced `value`.
    pub decision: PolicyDecision,
    /// Per-leaf detections, in walk order.
    pub leaves: Vec<LeafDetections>,
    /// The audit event emitted for this scan.
    pub audit_event: AuditEvent,
}

fn walk(value: &Value, path: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(s) => out.push((path.to_string(), s.clone())),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                walk(item, &format!("{path}[{idx}]"), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                walk(item, &format!("{path}.{key}"), out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn rewrite(value: &Value, path: &str, redactions: &std::collections::HashMap<String, String>) -> Value {
    match value {
        Value::String(_) => {
            Value::String(redactions.get(path).cloned().unwrap_or_else(|| value.as_str().unwrap().to_string()))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| rewrite(item, &format!("{path}[{idx}]"), redactions))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), rewrite(item, &format!("{path}.{key}"), redactions));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Recursively classifies every leaf string of a JSON-like value and
/// applies one policy decision to the union of tags found.
pub struct StructuredScanner {
    classifier: Classifier,
    policy: Arc<PolicyEngine>,
    audit: Arc<AuditLogger>,
}

impl StructuredScanner {
    /// Builds a scanner over shared classifier/policy/audit handles.
    #[must_use]
    pub fn new(classifier: Classifier, policy: Arc<PolicyEngine>, audit: Arc<AuditLogger>) -> Self {
        Self { classifier, policy, audit }
    }

    /// Scans `payload` for `agent_id` at the given boundary (spec.md
    /// §4.11; the structured scanner is reused for either the input or
    /// output boundary depending on where the payload originates).
    pub fn scan(
        &self,
        payload: &Value,
        agent_id: &str,
        boundary: Boundary,
    ) -> safeai_core::Result<StructuredScanResult> {
        let mut leaves_raw = Vec::new();
        walk(payload, "$", &mut leaves_raw);

        let mut leaves = Vec::with_capacity(leaves_raw.len());
        let mut all_tags: Vec<String> = Vec::new();
        for (path, text) in &leaves_raw {
            let detections = self.classifier.classify(text);
            all_tags.extend(detections.iter().map(|d| d.tag.clone()));
            leaves.push(LeafDetections { path: path.clone(), detections });
        }

        let ctx = PolicyContext::new(boundary, &all_tags, agent_id);
        let decision = self.policy.evaluate(&ctx);

        let value = match decision.action {
            DecisionAction::Block | DecisionAction::RequireApproval => None,
            DecisionAction::Allow => Some(payload.clone()),
            DecisionAction::Redact => {
                let mut redactions = std::collections::HashMap::new();
                for leaf in &leaves {
                    if leaf.detections.is_empty() {
                        continue;
                    }
                    let (_, text) = leaves_raw.iter().find(|(p, _)| p == &leaf.path).expect("path exists");
                    redactions.insert(leaf.path.clone(), redact_spans(text, &leaf.detections));
                }
                Some(rewrite(payload, "$", &redactions))
            }
        };

        let detection_summaries: Vec<Value> = leaves
            .iter()
            .filter(|l| !l.detections.is_empty())
            .map(|l| json!({ "path": l.path, "tags": l.detections.iter().map(|d| d.tag.clone()).collect::<Vec<_>>() }))
            .collect();

        let event = AuditEventBuilder::new(boundary, AuditAction::from(decision.action))
            .policy_name(decision.policy_name.clone().unwrap_or_default())
            .reason(decision.reason.clone())
            .data_tags(all_tags)
            .agent_id(agent_id)
            .metadata(json!({
                "phase": "structured_scan",
                "nodes_scanned": leaves_raw.len(),
                "detections": detection_summaries,
            }))
            .build();
        let audit_event = self.audit.emit(event)?;

        Ok(StructuredScanResult { value, decision, leaves, audit_event })
    }
}

#[cfg(test)]
mod tests {
    use safeai_core::DecisionAction;
    use safeai_policy::{load_path, Engine};

    use super::*;

    fn engine_from_yaml(dir: &tempfile::TempDir, yaml: &str) -> Arc<PolicyEngine> {
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, yaml).unwrap();
        Arc::new(Engine::from_rules(load_path(&path).unwrap()))
    }

    #[test]
    fn walks_nested_arrays_and_objects() {
        let dir = tempfile::tempdir().unwrap();
        let policy = engine_from_yaml(
            &dir,
            "rules:\n  - name: allow-all\n    boundary: [input]\n    action: allow\n    reason: ok\n    priority: 1\n",
        );
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let scanner = StructuredScanner::new(classifier, policy, audit);

        let payload = json!({"notes": ["fine", "a@example.com"], "nested": {"x": "also fine"}});
        let result = scanner.scan(&payload, "agent-1", Boundary::Input).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Allow);
        assert_eq!(result.leaves.len(), 3);
    }

    #[test]
    fn redact_rewrites_only_flagged_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let policy = engine_from_yaml(
            &dir,
            r#"
rules:
  - name: redact-pii
    boundary: [input]
    action: redact
    reason: "redact personal data"
    priority: 1
    condition:
      data_tags: personal.pii
"#,
        );
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let scanner = StructuredScanner::new(classifier, policy, audit);

        let payload = json!({"notes": "fine", "email": "a@example.com"});
        let result = scanner.scan(&payload, "agent-1", Boundary::Input).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Redact);
        let value = result.value.unwrap();
        assert_eq!(value["notes"], json!("fine"));
        assert_eq!(value["email"], json!("[REDACTED]"));
    }

    #[test]
    fn block_returns_no_value() {
        let dir = tempfile::tempdir().unwrap();
        let policy = engine_from_yaml(
            &dir,
            r#"
rules:
  - name: block-secrets
    boundary: [input]
    action: block
    reason: "no secrets"
    priority: 1
    condition:
      data_tags: secret.credential
"#,
        );
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let scanner = StructuredScanner::new(classifier, policy, audit);

        let payload = json!({"key": "sk-ABCDEFGHIJKLMNOPQRSTUVWX"});
        let result = scanner.scan(&payload, "agent-1", Boundary::Input).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Block);
        assert!(result.value.is_none());
    }
}
