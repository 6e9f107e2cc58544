//! Input scanner (spec component C10, spec.md §4.10): classify → collect
//! tag set → evaluate with `boundary=input` → apply text action.
//!
//! Grounded on `original_source/safeai/core/input_scanner.py`'s
//! `InputScanner.scan`, composing `safeai-classifier`, `safeai-policy`, and
//! `safeai-audit` the way `safeai-memory`'s controller composes
//! `safeai-policy`/`safeai-audit` for handle resolution.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use safeai_audit::{AuditEvent, AuditEventBuilder, AuditLogger};
use safeai_classifier::Classifier;
use safeai_core::{AuditAction, Boundary, Detection, DecisionAction, PolicyDecision};
use safeai_policy::{Engine as PolicyEngine, PolicyContext};

use crate::redact::redact_spans;

/// Outcome of one [`InputScanner::scan`] call.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Text after the decided action is applied (`block` ⇒ empty string,
    /// `redact` ⇒ spans replaced, `allow` ⇒ unchanged).
    pub text: String,
    /// The policy decision that produced `text`.
    pub decision: PolicyDecision,
    /// Every classifier detection found in the original text.
    pub detections: Vec<Detection>,
    /// The audit event emitted for this scan.
    pub audit_event: AuditEvent,
}

/// Applies the classify → tag → policy → text-action pipeline to scalar
/// text crossing one boundary. Reused by [`crate::OutputGuard`] with
/// `boundary=output` in place of `boundary=input`.
pub struct InputScanner {
    classifier: Classifier,
    policy: Arc<PolicyEngine>,
    audit: Arc<AuditLogger>,
}

impl InputScanner {
    /// Builds a scanner over shared classifier/policy/audit handles.
    #[must_use]
    pub fn new(classifier: Classifier, policy: Arc<PolicyEngine>, audit: Arc<AuditLogger>) -> Self {
        Self { classifier, policy, audit }
    }

    /// Scans `text` for `agent_id`, evaluating at `boundary=input`
    /// (spec.md §4.10). Emits one audit event.
    pub fn scan(&self, text: &str, agent_id: &str) -> safeai_core::Result<ScanResult> {
        let outcome = self.evaluate_at(text, agent_id, Boundary::Input);
        let audit_event = self.emit_scan_event(Boundary::Input, agent_id, &outcome, json!({}))?;
        Ok(ScanResult {
            text: outcome.text,
            decision: outcome.decision,
            detections: outcome.detections,
            audit_event,
        })
    }

    /// Runs classify → tag → policy → text-action without emitting an
    /// audit event, so callers that need to compute something from the
    /// decision first (e.g. [`crate::OutputGuard`]'s fallback rendering)
    /// can fold that into the one audit event the boundary call emits.
    pub(crate) fn evaluate_at(&self, text: &str, agent_id: &str, boundary: Boundary) -> ScanOutcome {
        let detections = self.classifier.classify(text);
        let tags: Vec<String> = detections.iter().map(|d| d.tag.clone()).collect();
        let ctx = PolicyContext::new(boundary, &tags, agent_id);
        let decision = self.policy.evaluate(&ctx);

        let applied = match decision.action {
            DecisionAction::Block => String::new(),
            DecisionAction::Redact => redact_spans(text, &detections),
            DecisionAction::Allow | DecisionAction::RequireApproval => text.to_string(),
        };

        ScanOutcome { text: applied, decision, detections, tags }
    }

    /// Emits the one audit event for a boundary call, merging `extra_metadata`
    /// keys (e.g. `fallback_used`) into the standard `decision_source`/
    /// `detection_count` metadata.
    pub(crate) fn emit_scan_event(
        &self,
        boundary: Boundary,
        agent_id: &str,
        outcome: &ScanOutcome,
        extra_metadata: serde_json::Value,
    ) -> safeai_core::Result<AuditEvent> {
        let mut metadata = json!({
            "decision_source": "policy",
            "detection_count": outcome.detections.len(),
        });
        if let (Some(base), Some(extra)) = (metadata.as_object_mut(), extra_metadata.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }

        let event = AuditEventBuilder::new(boundary, AuditAction::from(outcome.decision.action))
            .policy_name(outcome.decision.policy_name.clone().unwrap_or_default())
            .reason(outcome.decision.reason.clone())
            .data_tags(outcome.tags.clone())
            .agent_id(agent_id)
            .metadata(metadata)
            .build();
        self.audit.emit(event)
    }
}

/// Result of [`InputScanner::evaluate_at`]: the decided text/decision
/// without an audit event yet emitted.
pub(crate) struct ScanOutcome {
    pub(crate) text: String,
    pub(crate) decision: PolicyDecision,
    pub(crate) detections: Vec<Detection>,
    pub(crate) tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use safeai_core::DecisionAction;
    use safeai_policy::{load_path, Engine};

    use super::*;

    fn write_policy(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn blocks_and_empties_text_on_secret_detection() {
        let dir = tempfile::tempdir().unwrap();
        let policy_path = write_policy(
            &dir,
            r#"
rules:
  - name: block-api-keys
    boundary: [input]
    action: block
    reason: "api keys are never allowed"
    priority: 1
    condition:
      data_tags: secret.credential
"#,
        );
        let policy = Arc::new(Engine::from_rules(load_path(&policy_path).unwrap()));
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let scanner = InputScanner::new(classifier, policy, audit);

        let result = scanner.scan("my key is sk-ABCDEFGHIJKLMNOPQRSTUVWX", "agent-1").unwrap();
        assert_eq!(result.decision.action, DecisionAction::Block);
        assert_eq!(result.text, "");
    }

    #[test]
    fn redacts_detected_spans_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let policy_path = write_policy(
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
        let policy = Arc::new(Engine::from_rules(load_path(&policy_path).unwrap()));
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let scanner = InputScanner::new(classifier, policy, audit);

        let result = scanner.scan("contact me at a@example.com", "agent-1").unwrap();
        assert_eq!(result.decision.action, DecisionAction::Redact);
        assert!(result.text.contains("[REDACTED]"));
        assert!(!result.text.contains("a@example.com"));
    }

    #[test]
    fn allow_leaves_text_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let policy_path = write_policy(
            &dir,
            "rules:\n  - name: allow-all\n    boundary: [input]\n    action: allow\n    reason: ok\n    priority: 1\n",
        );
        let policy = Arc::new(Engine::from_rules(load_path(&policy_path).unwrap()));
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let scanner = InputScanner::new(classifier, policy, audit);

        let result = scanner.scan("nothing sensitive here", "agent-1").unwrap();
        assert_eq!(result.decision.action, DecisionAction::Allow);
        assert_eq!(result.text, "nothing sensitive here");
    }
}
