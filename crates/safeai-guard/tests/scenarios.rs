//! End-to-end boundary scenarios composing every registry crate the way a
//! real embedder would, matching the concrete scenarios in spec.md §8
//! (S1-S7). Unit tests inside each `safeai-guard` module already cover the
//! single-stage behavior of each pipeline; these integration tests exercise
//! full cross-crate wiring: capability tokens gating tool calls, contract
//! field filtering and response re-classification, and approval-gated
//! request/response round trips.

use std::sync::Arc;

use serde_json::{json, Map};

use safeai_approval::ApprovalManager;
use safeai_audit::AuditLogger;
use safeai_capability::CapabilityTokenManager;
use safeai_classifier::Classifier;
use safeai_contracts::{ToolContract, ToolContractRegistry, ToolIoSurface, ToolSideEffects, ToolStores};
use safeai_core::DecisionAction;
use safeai_guard::{ActionInterceptor, ToolCall};
use safeai_identity::AgentIdentityRegistry;
use safeai_policy::{load_path, Engine as PolicyEngine};

fn write_policy(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("policy.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

fn send_email_contract() -> ToolContract {
    ToolContract {
        tool_name: "send_email".to_string(),
        description: None,
        accepts: ToolIoSurface {
            tags: vec!["internal".to_string()],
            fields: vec!["to".to_string(), "subject".to_string()],
        },
        emits: ToolIoSurface { tags: vec!["internal".to_string()], fields: vec!["status".to_string()] },
        stores: ToolStores::default(),
        side_effects: ToolSideEffects { reversible: false, requires_approval: false, description: None },
    }
}

fn interceptor(dir: &tempfile::TempDir, policy_yaml: &str, contract: ToolContract) -> ActionInterceptor {
    let policy_path = write_policy(dir, policy_yaml);
    let policy = Arc::new(PolicyEngine::from_rules(load_path(&policy_path).unwrap()));
    let contracts = Arc::new(ToolContractRegistry::from_contracts(vec![contract]).unwrap());
    let identities = Arc::new(AgentIdentityRegistry::new());
    let capabilities = Arc::new(CapabilityTokenManager::new());
    let approvals = Arc::new(ApprovalManager::open(dir.path().join("approvals.jsonl")).unwrap());
    let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
    let classifier = Classifier::new(&[]).unwrap();
    ActionInterceptor::new(classifier, policy, contracts, identities, capabilities, approvals, audit)
}

fn call(tool_name: &str, parameters: Map<String, serde_json::Value>) -> ToolCall {
    ToolCall {
        tool_name: tool_name.to_string(),
        agent_id: "agent-1".to_string(),
        parameters,
        data_tags: vec!["internal".to_string()],
        session_id: None,
        source_agent_id: None,
        destination_agent_id: None,
        action_type: None,
        capability_token_id: None,
        capability_action: "invoke".to_string(),
        approval_request_id: None,
    }
}

/// S3: contract field filtering on request, and on an emits-filtered
/// response field (spec.md §8 scenario S3).
#[test]
fn s3_request_and_response_are_filtered_by_contract_fields() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(
        &dir,
        "rules:\n  - name: allow-action\n    boundary: [action]\n    action: allow\n    reason: ok\n    priority: 1000\n",
        send_email_contract(),
    );

    let mut parameters = Map::new();
    parameters.insert("to".to_string(), json!("ops@example.com"));
    parameters.insert("subject".to_string(), json!("status"));
    parameters.insert("body".to_string(), json!("the full message body"));

    let request = interceptor.intercept_request(&call("send_email", parameters)).unwrap();
    assert_eq!(request.decision.action, DecisionAction::Allow);
    assert!(request.filtered_params.contains_key("to"));
    assert!(request.filtered_params.contains_key("subject"));
    assert!(!request.filtered_params.contains_key("body"));
    assert_eq!(request.stripped_fields, vec!["body".to_string()]);

    let mut response = Map::new();
    response.insert("status".to_string(), json!("sent"));
    response.insert("message_id".to_string(), json!("m-123"));

    let call = call("send_email", Map::new());
    let result = interceptor.intercept_response(&call, &response).unwrap();
    assert_eq!(result.decision.action, DecisionAction::Redact);
    assert!(result.filtered_response.contains_key("status"));
    assert!(!result.filtered_response.contains_key("message_id"));
    assert_eq!(result.stripped_fields, vec!["message_id".to_string()]);
}

/// S4: a response field whose re-classified tags fall outside the
/// contract's `emits.tags` is stripped even though its name would
/// otherwise be allowed (spec.md §8 scenario S4).
#[test]
fn s4_response_field_stripped_when_reclassified_tag_is_not_emitted() {
    let dir = tempfile::tempdir().unwrap();
    let mut contract = send_email_contract();
    contract.emits.fields = Vec::new(); // no field allow-list, only tag filtering matters here
    let interceptor = interceptor(
        &dir,
        "rules:\n  - name: allow-action\n    boundary: [action]\n    action: allow\n    reason: ok\n    priority: 1000\n",
        contract,
    );

    let mut response = Map::new();
    response.insert("status".to_string(), json!("ok"));
    response.insert("recipient".to_string(), json!("alice@example.com"));

    let result = interceptor.intercept_response(&call("send_email", Map::new()), &response).unwrap();
    assert_eq!(result.decision.action, DecisionAction::Redact);
    assert!(result.filtered_response.contains_key("status"));
    assert!(!result.filtered_response.contains_key("recipient"));
    assert!(result.stripped_tags.iter().any(|t| t == "personal.pii"));
}

/// A response field that re-classifies to *more than one* tag must have
/// every one of those tags accepted by `emits.tags`, not just one of
/// them — the any-vs-all regression this test pins (spec.md §4.12(c)).
#[test]
fn s4b_response_field_with_multiple_tags_requires_all_tags_emitted() {
    let dir = tempfile::tempdir().unwrap();
    let mut contract = send_email_contract();
    contract.emits.fields = Vec::new();
    contract.emits.tags = vec!["personal.pii".to_string()];
    let interceptor = interceptor(
        &dir,
        "rules:\n  - name: allow-action\n    boundary: [action]\n    action: allow\n    reason: ok\n    priority: 1000\n",
        contract,
    );

    let mut response = Map::new();
    response.insert("status".to_string(), json!("ok"));
    // Re-classifies to both `personal.pii` (email) and `secret.token`
    // (generic token) — only `personal.pii` is in `emits.tags`, so the
    // whole field must be stripped even though one of its tags matches.
    response.insert(
        "contact".to_string(),
        json!("reach alice@example.com, token=abcdef123456789012"),
    );

    let result = interceptor.intercept_response(&call("send_email", Map::new()), &response).unwrap();
    assert_eq!(result.decision.action, DecisionAction::Redact);
    assert!(result.filtered_response.contains_key("status"));
    assert!(!result.filtered_response.contains_key("contact"));
    assert!(result.stripped_tags.iter().any(|t| t == "secret.token"));
}

/// S6: a `require_approval` policy gates the first request, `approve`
/// unblocks a second request carrying the approval id (spec.md §8 scenario
/// S6), with the capability-token stage still checked first per
/// SPEC_FULL.md §9's Open Question resolution.
#[test]
fn s6_approval_gate_round_trip_with_capability_token_checked_first() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(
        &dir,
        r#"
rules:
  - name: gate-send-email
    boundary: [action]
    action: require_approval
    reason: "sending email requires a human"
    priority: 1
    condition:
      tools: send_email
"#,
        send_email_contract(),
    );

    let mut parameters = Map::new();
    parameters.insert("to".to_string(), json!("ops@example.com"));
    parameters.insert("subject".to_string(), json!("status"));

    let first = interceptor.intercept_request(&call("send_email", parameters.clone())).unwrap();
    assert_eq!(first.decision.action, DecisionAction::RequireApproval);
    let request_id = first.approval_request_id.clone().unwrap();

    // Without supplying the id, a second identical call dedupes to the
    // same pending request rather than minting a new one.
    let second = interceptor.intercept_request(&call("send_email", parameters.clone())).unwrap();
    assert_eq!(second.approval_request_id.as_deref(), Some(request_id.as_str()));

    let approvals = ApprovalManager::open(dir.path().join("approvals.jsonl")).unwrap();
    assert!(approvals.approve(&request_id, "reviewer-1", None).unwrap());

    let mut gated_call = call("send_email", parameters);
    gated_call.approval_request_id = Some(request_id);
    let third = interceptor.intercept_request(&gated_call).unwrap();
    assert_eq!(third.decision.action, DecisionAction::Allow);
    assert_eq!(third.decision.policy_name.as_deref(), Some("approval-gate"));
    assert!(third.filtered_params.contains_key("to"));
}

/// A capability-token failure short-circuits before the contract stage
/// ever runs, so an unregistered tool with a bad token still reports
/// `decision_source: capability` (SPEC_FULL.md §9 Open Question).
#[test]
fn capability_failure_short_circuits_before_contract_check() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(
        &dir,
        "rules:\n  - name: allow-action\n    boundary: [action]\n    action: allow\n    reason: ok\n    priority: 1000\n",
        send_email_contract(),
    );

    let mut bad_call = call("not-a-declared-tool", Map::new());
    bad_call.capability_token_id = Some("cap_does_not_exist".to_string());

    let result = interceptor.intercept_request(&bad_call).unwrap();
    assert_eq!(result.decision.action, DecisionAction::Block);
    assert_eq!(result.decision.policy_name.as_deref(), Some("capability-token"));
}
