//! Output guard (spec component C12, spec.md §4.10): the input scanner's
//! pipeline run at `boundary=output`, plus fallback-template rendering when
//! the decision blocks or redacts.
//!
//! Grounded on `original_source/safeai/core/output_guard.py`'s
//! `OutputGuard.guard` and its `_render_fallback` placeholder substitution.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use safeai_audit::{AuditEvent, AuditLogger};
use safeai_classifier::Classifier;
use safeai_core::{Boundary, Detection, DecisionAction, PolicyDecision};
use safeai_policy::Engine as PolicyEngine;

use crate::input::InputScanner;

/// Outcome of one [`OutputGuard::guard`] call.
#[derive(Debug, Clone, Serialize)]
pub struct GuardResult {
    /// Text after the decided action (and fallback rendering, if any).
    pub text: String,
    /// The policy decision that produced `text`.
    pub decision: PolicyDecision,
    /// Every classifier detection found in the original text.
    pub detections: Vec<Detection>,
    /// Whether a `fallback_template` was rendered in place of `text`.
    pub fallback_used: bool,
    /// The audit event emitted for this guard call.
    pub audit_event: AuditEvent,
}

/// Renders `template` by substituting `{name}` placeholders from `vars`.
/// Unknown placeholders are preserved literally; an unmatched brace makes
/// the whole template malformed and it is returned unchanged (spec.md
/// §4.10 "malformed templates are returned literally (no exception)").
#[must_use]
pub fn render_template(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let Some(open) = rest.find('{') else {
            out.push_str(rest);
            return out;
        };
        let Some(close_rel) = rest[open..].find('}') else {
            return template.to_string();
        };
        let close = open + close_rel;
        out.push_str(&rest[..open]);
        let key = &rest[open + 1..close];
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
}

/// Applies the classify → tag → policy → text-action pipeline to outbound
/// text, with optional fallback-template rendering on a non-allow result.
pub struct OutputGuard {
    scanner: InputScanner,
}

impl OutputGuard {
    /// Builds a guard over shared classifier/policy/audit handles.
    #[must_use]
    pub fn new(classifier: Classifier, policy: Arc<PolicyEngine>, audit: Arc<AuditLogger>) -> Self {
        Self { scanner: InputScanner::new(classifier, policy, audit) }
    }

    /// Guards `text` leaving a model for `agent_id` (spec.md §4.10).
    pub fn guard(&self, text: &str, agent_id: &str) -> safeai_core::Result<GuardResult> {
        let scan = self.scanner.evaluate_at(text, agent_id, Boundary::Output);
        let mut fallback_used = false;
        let rendered_text = if matches!(scan.decision.action, DecisionAction::Block | DecisionAction::Redact) {
            if let Some(template) = &scan.decision.fallback_template {
                fallback_used = true;
                let mut vars = BTreeMap::new();
                vars.insert("original", text.to_string());
                vars.insert("redacted", scan.text.clone());
                vars.insert("reason", scan.decision.reason.clone());
                vars.insert("policy_name", scan.decision.policy_name.clone().unwrap_or_default());
                vars.insert("action", scan.decision.action.as_str().to_string());
                vars.insert("agent_id", agent_id.to_string());
                vars.insert(
                    "data_tags",
                    scan.detections.iter().map(|d| d.tag.clone()).collect::<Vec<_>>().join(","),
                );
                vars.insert(
                    "detections",
                    serde_json::to_string(&scan.detections).unwrap_or_default(),
                );
                render_template(template, &vars)
            } else {
                scan.text.clone()
            }
        } else {
            scan.text.clone()
        };

        let audit_event = self.scanner.emit_scan_event(
            Boundary::Output,
            agent_id,
            &scan,
            serde_json::json!({ "fallback_used": fallback_used }),
        )?;

        Ok(GuardResult {
            text: rendered_text,
            decision: scan.decision,
            detections: scan.detections,
            fallback_used,
            audit_event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_placeholders_are_preserved_literally() {
        let mut vars = BTreeMap::new();
        vars.insert("reason", "blocked".to_string());
        let out = render_template("was {reason} because {mystery}", &vars);
        assert_eq!(out, "was blocked because {mystery}");
    }

    #[test]
    fn malformed_template_returns_literally() {
        let mut vars = BTreeMap::new();
        vars.insert("reason", "blocked".to_string());
        let out = render_template("unterminated {reason", &vars);
        assert_eq!(out, "unterminated {reason");
    }

    #[test]
    fn guard_blocks_and_renders_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(
            &path,
            r#"
rules:
  - name: block-secrets
    boundary: [output]
    action: block
    reason: "secrets never leave the model"
    priority: 1
    condition:
      data_tags: secret.credential
    fallback_template: "response withheld: {reason}"
"#,
        )
        .unwrap();
        let policy = Arc::new(PolicyEngine::from_rules(safeai_policy::load_path(&path).unwrap()));
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let guard = OutputGuard::new(classifier, policy, audit);

        let result = guard.guard("my key is sk-ABCDEFGHIJKLMNOPQRSTUVWX", "agent-1").unwrap();
        assert!(result.fallback_used);
        assert_eq!(result.text, "response withheld: secrets never leave the model");
        assert_eq!(result.audit_event.metadata.get("fallback_used"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn guard_allow_records_fallback_used_false_in_audit_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(
            &path,
            "rules:\n  - name: allow-all\n    boundary: [output]\n    action: allow\n    reason: ok\n    priority: 1\n",
        )
        .unwrap();
        let policy = Arc::new(PolicyEngine::from_rules(safeai_policy::load_path(&path).unwrap()));
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        let guard = OutputGuard::new(classifier, policy, audit);

        let result = guard.guard("nothing sensitive here", "agent-1").unwrap();
        assert!(!result.fallback_used);
        assert_eq!(result.audit_event.metadata.get("fallback_used"), Some(&serde_json::json!(false)));
    }
}
