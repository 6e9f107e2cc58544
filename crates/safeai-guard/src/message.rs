//! Agent-to-agent message pipeline (spec component C16, SPEC_FULL.md §4.16):
//! classifier + action-boundary policy + approval gating applied to a
//! `source_agent_id -> destination_agent_id` message.
//!
//! Grounded on `original_source/safeai/core/action_interceptor.py`'s
//! approval-gating branch, reused here instead of duplicated, and on
//! `safeai-guard::InputScanner`'s text-action application.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use safeai_approval::{ApprovalManager, ApprovalStatus};
use safeai_audit::{AuditEvent, AuditEventBuilder, AuditLogger};
use safeai_classifier::Classifier;
use safeai_core::{AuditAction, Boundary, DecisionAction, PolicyDecision};
use safeai_policy::{Engine as PolicyEngine, PolicyContext};

use crate::redact::redact_spans;

/// One inter-agent message crossing the action boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentMessage {
    /// Message body.
    pub message: String,
    /// Sending agent.
    pub source_agent_id: String,
    /// Receiving agent.
    pub destination_agent_id: String,
    /// Tags already known to apply to this message, unioned with detected
    /// tags before policy evaluation.
    #[serde(default)]
    pub data_tags: Vec<String>,
    /// Session binding, when present.
    #[serde(default)]
    pub session_id: Option<String>,
    /// An already-decided approval request to validate against, if any.
    #[serde(default)]
    pub approval_request_id: Option<String>,
}

/// Outcome of [`AgentMessagePipeline::send`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentMessageResult {
    /// Final decision for the message.
    pub decision: PolicyDecision,
    /// Union of tags detected in the message and tags supplied on the call.
    pub data_tags: Vec<String>,
    /// The message after the decided action is applied.
    pub filtered_message: String,
    /// Id of a newly created or supplied approval request, if any.
    pub approval_request_id: Option<String>,
    /// The audit event emitted for this message.
    pub audit_event: AuditEvent,
}

/// Applies the classify → tag → action-boundary-policy → approval-gating
/// pipeline to inter-agent messages.
pub struct AgentMessagePipeline {
    classifier: Classifier,
    policy: Arc<PolicyEngine>,
    approvals: Arc<ApprovalManager>,
    audit: Arc<AuditLogger>,
}

impl AgentMessagePipeline {
    /// Builds a pipeline over shared classifier/policy/approval/audit
    /// handles.
    #[must_use]
    pub fn new(
        classifier: Classifier,
        policy: Arc<PolicyEngine>,
        approvals: Arc<ApprovalManager>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self { classifier, policy, approvals, audit }
    }

    /// Scans, decides, and (if required) gates approval for one message
    /// (SPEC_FULL.md §4.16).
    pub fn send(&self, message: &AgentMessage) -> safeai_core::Result<AgentMessageResult> {
        let detections = self.classifier.classify(&message.message);
        let mut tags: Vec<String> = message.data_tags.clone();
        tags.extend(detections.iter().map(|d| d.tag.clone()));
        tags.sort();
        tags.dedup();

        let ctx = PolicyContext::new(Boundary::Action, &tags, message.source_agent_id.clone())
            .with_action_type("agent-message");
        let mut decision = self.policy.evaluate(&ctx);
        let mut approval_request_id = None;

        if decision.action == DecisionAction::RequireApproval {
            if let Some(request_id) = &message.approval_request_id {
                let validation = self.approvals.validate(
                    request_id,
                    &message.source_agent_id,
                    "agent-message",
                    message.session_id.as_deref(),
                )?;
                decision = if validation.allowed {
                    PolicyDecision {
                        action: DecisionAction::Allow,
                        policy_name: Some(
                            decision.policy_name.clone().unwrap_or_else(|| "approval-gate".to_string()),
                        ),
                        reason: format!("approval request '{request_id}' approved"),
                        fallback_template: None,
                    }
                } else if matches!(
                    self.approvals.get(request_id)?.map(|r| r.status),
                    Some(ApprovalStatus::Denied)
                ) {
                    PolicyDecision::synthesized_block("approval-gate", validation.reason)
                } else {
                    PolicyDecision {
                        action: DecisionAction::RequireApproval,
                        policy_name: decision.policy_name.clone(),
                        reason: validation.reason,
                        fallback_template: decision.fallback_template.clone(),
                    }
                };
                approval_request_id = Some(request_id.clone());
            } else {
                let dedupe_key = format!(
                    "{}|{}|{}|{}",
                    message.source_agent_id,
                    message.destination_agent_id,
                    message.session_id.clone().unwrap_or_default(),
                    tags.join(","),
                );
                let request = self.approvals.create_request(
                    decision.reason.clone(),
                    decision.policy_name.clone(),
                    message.source_agent_id.clone(),
                    "agent-message",
                    message.session_id.clone(),
                    "agent-message",
                    tags.clone(),
                    json!({ "destination_agent_id": message.destination_agent_id }),
                    Some(dedupe_key),
                    None,
                )?;
                approval_request_id = Some(request.request_id);
            }
        }

        let filtered_message = match decision.action {
            DecisionAction::Block => String::new(),
            DecisionAction::Redact => redact_spans(&message.message, &detections),
            DecisionAction::Allow | DecisionAction::RequireApproval => message.message.clone(),
        };

        let event = AuditEventBuilder::new(Boundary::Action, AuditAction::from(decision.action))
            .policy_name(decision.policy_name.clone().unwrap_or_default())
            .reason(decision.reason.clone())
            .data_tags(tags.clone())
            .agent_id(message.source_agent_id.clone())
            .source_agent_id(message.source_agent_id.clone())
            .destination_agent_id(message.destination_agent_id.clone())
            .metadata(json!({
                "decision_source": "agent-message",
                "approval_request_id": approval_request_id,
            }))
            .build();
        let audit_event = self.audit.emit(event)?;

        Ok(AgentMessageResult { decision, data_tags: tags, filtered_message, approval_request_id, audit_event })
    }
}

#[cfg(test)]
mod tests {
    use safeai_policy::{load_path, Engine};

    use super::*;

    fn pipeline(dir: &tempfile::TempDir, yaml: &str) -> AgentMessagePipeline {
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, yaml).unwrap();
        let policy = Arc::new(Engine::from_rules(load_path(&path).unwrap()));
        let approvals = Arc::new(ApprovalManager::open(dir.path().join("approvals.jsonl")).unwrap());
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        AgentMessagePipeline::new(classifier, policy, approvals, audit)
    }

    #[test]
    fn allow_leaves_message_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            &dir,
            "rules:\n  - name: allow-all\n    boundary: [action]\n    action: allow\n    reason: ok\n    priority: 1\n",
        );
        let message = AgentMessage {
            message: "status update".to_string(),
            source_agent_id: "agent-1".to_string(),
            destination_agent_id: "agent-2".to_string(),
            data_tags: Vec::new(),
            session_id: None,
            approval_request_id: None,
        };
        let result = pipeline.send(&message).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Allow);
        assert_eq!(result.filtered_message, "status update");
    }

    #[test]
    fn require_approval_creates_pending_request_when_none_supplied() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            &dir,
            r#"
rules:
  - name: gate-transfers
    boundary: [action]
    action: require_approval
    reason: "human must approve inter-agent transfers"
    priority: 1
    condition:
      data_tags: finance.transfer
"#,
        );
        let message = AgentMessage {
            message: "wire funds".to_string(),
            source_agent_id: "agent-1".to_string(),
            destination_agent_id: "agent-2".to_string(),
            data_tags: vec!["finance.transfer".to_string()],
            session_id: None,
            approval_request_id: None,
        };
        let result = pipeline.send(&message).unwrap();
        assert_eq!(result.decision.action, DecisionAction::RequireApproval);
        assert!(result.approval_request_id.is_some());
    }

    #[test]
    fn approved_request_flips_decision_to_allow() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            &dir,
            r#"
rules:
  - name: gate-transfers
    boundary: [action]
    action: require_approval
    reason: "human must approve inter-agent transfers"
    priority: 1
    condition:
      data_tags: finance.transfer
"#,
        );
        let request = pipeline
            .approvals
            .create_request(
                "human must approve".to_string(),
                Some("gate-transfers".to_string()),
                "agent-1".to_string(),
                "agent-message",
                None,
                "agent-message".to_string(),
                vec!["finance.transfer".to_string()],
                json!({}),
                None,
                None,
            )
            .unwrap();
        pipeline.approvals.approve(&request.request_id, "reviewer-1", None).unwrap();

        let message = AgentMessage {
            message: "wire funds".to_string(),
            source_agent_id: "agent-1".to_string(),
            destination_agent_id: "agent-2".to_string(),
            data_tags: vec!["finance.transfer".to_string()],
            session_id: None,
            approval_request_id: Some(request.request_id),
        };
        let result = pipeline.send(&message).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Allow);
        assert_eq!(result.filtered_message, "wire funds");
    }
}
