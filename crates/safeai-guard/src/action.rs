//! Action interceptor (spec component C13, "the hardest subsystem",
//! spec.md §4.12): the tool-call request/response lifecycle —
//! capability → contract → identity → field filter → policy → approval
//! gating → final gate, then a field-level re-classification pass on the
//! response.
//!
//! Grounded on `original_source/safeai/core/action_interceptor.py`'s
//! `ActionInterceptor.intercept_request`/`intercept_response`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use safeai_approval::{ApprovalManager, ApprovalStatus};
use safeai_audit::{AuditEvent, AuditEventBuilder, AuditLogger};
use safeai_capability::CapabilityTokenManager;
use safeai_classifier::Classifier;
use safeai_contracts::ToolContractRegistry;
use safeai_core::{
    tags_intersect_hierarchically, AuditAction, Boundary, DecisionAction, PolicyDecision,
};
use safeai_identity::AgentIdentityRegistry;
use safeai_policy::{Engine as PolicyEngine, PolicyContext};

/// One tool invocation crossing the action boundary (spec.md §4.12).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCall {
    /// Tool being invoked.
    pub tool_name: String,
    /// Agent making the call.
    pub agent_id: String,
    /// Request parameters.
    pub parameters: Map<String, Value>,
    /// Tags already known to apply to this call's data.
    #[serde(default)]
    pub data_tags: Vec<String>,
    /// Session binding, when present.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Originating agent, for agent-to-agent calls.
    #[serde(default)]
    pub source_agent_id: Option<String>,
    /// Destination agent, for agent-to-agent calls.
    #[serde(default)]
    pub destination_agent_id: Option<String>,
    /// Free-form action type discriminator passed to the policy engine.
    #[serde(default)]
    pub action_type: Option<String>,
    /// Capability token presented for this call, if any.
    #[serde(default)]
    pub capability_token_id: Option<String>,
    /// Action validated against the capability token's scope.
    #[serde(default = "default_capability_action")]
    pub capability_action: String,
    /// An already-decided approval request to validate against, if any.
    #[serde(default)]
    pub approval_request_id: Option<String>,
}

fn default_capability_action() -> String {
    "invoke".to_string()
}

/// Outcome of [`ActionInterceptor::intercept_request`].
#[derive(Debug, Clone, Serialize)]
pub struct InterceptResult {
    /// Final decision, possibly rewritten by approval gating.
    pub decision: PolicyDecision,
    /// Parameters surviving every gate (empty on any non-allow outcome).
    pub filtered_params: Map<String, Value>,
    /// Parameter keys removed by any stage.
    pub stripped_fields: Vec<String>,
    /// Id of a newly created approval request, if one was created.
    pub approval_request_id: Option<String>,
    /// The audit event emitted for this call.
    pub audit_event: AuditEvent,
}

/// Outcome of [`ActionInterceptor::intercept_response`].
#[derive(Debug, Clone, Serialize)]
pub struct ResponseInterceptResult {
    /// Final decision for the response.
    pub decision: PolicyDecision,
    /// Response fields surviving every gate.
    pub filtered_response: Map<String, Value>,
    /// Response keys present before filtering.
    pub response_keys: Vec<String>,
    /// Response keys present after filtering.
    pub filtered_response_keys: Vec<String>,
    /// Response field names dropped.
    pub stripped_fields: Vec<String>,
    /// Tags dropped along with their fields.
    pub stripped_tags: Vec<String>,
    /// The audit event emitted for this response.
    pub audit_event: AuditEvent,
}

fn classify_value(classifier: &Classifier, value: &Value) -> Vec<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    classifier.classify(&text).into_iter().map(|d| d.tag).collect()
}

/// Composes the capability/contract/identity/policy/approval subsystems
/// into the tool-call request and response pipelines.
pub struct ActionInterceptor {
    classifier: Classifier,
    policy: Arc<PolicyEngine>,
    contracts: Arc<ToolContractRegistry>,
    identities: Arc<AgentIdentityRegistry>,
    capabilities: Arc<CapabilityTokenManager>,
    approvals: Arc<ApprovalManager>,
    audit: Arc<AuditLogger>,
}

impl ActionInterceptor {
    /// Builds an interceptor over shared registry/manager handles.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: Classifier,
        policy: Arc<PolicyEngine>,
        contracts: Arc<ToolContractRegistry>,
        identities: Arc<AgentIdentityRegistry>,
        capabilities: Arc<CapabilityTokenManager>,
        approvals: Arc<ApprovalManager>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self { classifier, policy, contracts, identities, capabilities, approvals, audit }
    }

    fn finish_request(
        &self,
        call: &ToolCall,
        decision: PolicyDecision,
        decision_source: &str,
        filtered_params: Map<String, Value>,
        stripped_fields: Vec<String>,
        approval_request_id: Option<String>,
    ) -> safeai_core::Result<InterceptResult> {
        let mut builder = AuditEventBuilder::new(Boundary::Action, AuditAction::from(decision.action))
            .policy_name(decision.policy_name.clone().unwrap_or_default())
            .reason(decision.reason.clone())
            .data_tags(call.data_tags.clone())
            .agent_id(call.agent_id.clone())
            .tool_name(call.tool_name.clone())
            .metadata(json!({
                "decision_source": decision_source,
                "stripped_fields": stripped_fields,
                "approval_request_id": approval_request_id,
            }));
        if let Some(session) = &call.session_id {
            builder = builder.session_id(session.clone());
        }
        if let Some(source) = &call.source_agent_id {
            builder = builder.source_agent_id(source.clone());
        }
        if let Some(dest) = &call.destination_agent_id {
            builder = builder.destination_agent_id(dest.clone());
        }
        let audit_event = self.audit.emit(builder.build())?;
        Ok(InterceptResult { decision, filtered_params, stripped_fields, approval_request_id, audit_event })
    }

    /// Runs the seven-step request pipeline for `call` (spec.md §4.12).
    pub fn intercept_request(&self, call: &ToolCall) -> safeai_core::Result<InterceptResult> {
        let all_keys: Vec<String> = call.parameters.keys().cloned().collect();

        // 1. Capability.
        if let Some(token_id) = &call.capability_token_id {
            let result = self.capabilities.validate(
                token_id,
                &call.agent_id,
                &call.tool_name,
                &call.capability_action,
                call.session_id.as_deref(),
            );
            if !result.allowed {
                let decision = PolicyDecision::synthesized_block("capability-token", result.reason);
                return self.finish_request(call, decision, "capability", Map::new(), all_keys, None);
            }
        }

        // 2. Contract.
        let contract_result = self.contracts.validate_request(&call.tool_name, &call.data_tags);
        if !contract_result.allowed {
            let decision = PolicyDecision::synthesized_block("tool-contract", contract_result.reason);
            return self.finish_request(call, decision, "contract", Map::new(), all_keys, None);
        }

        // 3. Identity.
        let identity_result =
            self.identities.validate(&call.agent_id, Some(&call.tool_name), &call.data_tags);
        if !identity_result.allowed {
            let decision = PolicyDecision::synthesized_block("agent-identity", identity_result.reason);
            return self.finish_request(call, decision, "identity", Map::new(), all_keys, None);
        }

        // 4. Field filter.
        let mut filtered_params = call.parameters.clone();
        let mut stripped_fields = Vec::new();
        if let Some(contract) = self.contracts.get(&call.tool_name) {
            if !contract.accepts.fields.is_empty() {
                let allowed: BTreeSet<&String> = contract.accepts.fields.iter().collect();
                let drop_keys: Vec<String> = filtered_params
                    .keys()
                    .filter(|k| !allowed.contains(k))
                    .cloned()
                    .collect();
                for key in drop_keys {
                    filtered_params.remove(&key);
                    stripped_fields.push(key);
                }
            }
        }

        // 5. Policy.
        let mut ctx = PolicyContext::new(Boundary::Action, &call.data_tags, call.agent_id.clone())
            .with_tool(call.tool_name.clone());
        if let Some(action_type) = &call.action_type {
            ctx = ctx.with_action_type(action_type.clone());
        }
        let mut decision = self.policy.evaluate(&ctx);
        let mut approval_request_id = None;

        // 6. Approval gating.
        if decision.action == DecisionAction::RequireApproval {
            if let Some(request_id) = &call.approval_request_id {
                let validation = self.approvals.validate(
                    request_id,
                    &call.agent_id,
                    &call.tool_name,
                    call.session_id.as_deref(),
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
                    "{}|{}|{}|{}|{}|{}",
                    call.agent_id,
                    call.tool_name,
                    call.session_id.clone().unwrap_or_default(),
                    call.source_agent_id.clone().unwrap_or_default(),
                    call.data_tags.join(","),
                    {
                        let mut keys: Vec<&String> = filtered_params.keys().collect();
                        keys.sort();
                        keys.into_iter().cloned().collect::<Vec<_>>().join(",")
                    },
                );
                let request = self.approvals.create_request(
                    decision.reason.clone(),
                    decision.policy_name.clone(),
                    call.agent_id.clone(),
                    call.tool_name.clone(),
                    call.session_id.clone(),
                    call.action_type.clone().unwrap_or_else(|| "invoke".to_string()),
                    call.data_tags.clone(),
                    json!({}),
                    Some(dedupe_key),
                    None,
                )?;
                approval_request_id = Some(request.request_id);
            }
        }

        // 7. Final gate.
        if decision.action.is_non_allow() {
            let mut keys: Vec<String> = filtered_params.keys().cloned().collect();
            stripped_fields.append(&mut keys);
            stripped_fields.sort();
            stripped_fields.dedup();
            filtered_params.clear();
        }

        self.finish_request(call, decision, "policy", filtered_params, stripped_fields, approval_request_id)
    }

    /// Runs the response pipeline for `call`'s tool against `response`
    /// (spec.md §4.12 second half).
    pub fn intercept_response(
        &self,
        call: &ToolCall,
        response: &Map<String, Value>,
    ) -> safeai_core::Result<ResponseInterceptResult> {
        let response_keys: Vec<String> = response.keys().cloned().collect();

        let Some(contract) = self.contracts.get(&call.tool_name) else {
            let decision = PolicyDecision::synthesized_block(
                "tool-contract",
                format!("tool '{}' has no declared contract", call.tool_name),
            );
            return self.finish_response(call, decision, Map::new(), response_keys, Vec::new(), Vec::new(), Vec::new());
        };

        let identity_result = self.identities.validate(&call.agent_id, Some(&call.tool_name), &[]);
        if !identity_result.allowed {
            let decision = PolicyDecision::synthesized_block("agent-identity", identity_result.reason);
            return self.finish_response(call, decision, Map::new(), response_keys, Vec::new(), Vec::new(), Vec::new());
        }

        let emits_fields_enforced = !contract.emits.fields.is_empty();
        let mut filtered_response = Map::with_capacity(response.len());
        let mut stripped_fields = Vec::new();
        let mut stripped_tags = Vec::new();
        let mut kept_tags: Vec<String> = Vec::new();

        for (key, value) in response {
            let field_tags = classify_value(&self.classifier, value);

            let identity_ok = self.identities.validate(&call.agent_id, None, &field_tags).allowed;
            let contract_field_ok = !emits_fields_enforced || contract.emits.fields.contains(key);
            // Mirrors `_field_blocked_by_contract`: empty `emits.tags` accepts
            // everything; otherwise every one of the field's tags must have
            // an accepted ancestor, not just one of them.
            let tags_ok = contract.emits.tags.is_empty()
                || field_tags.iter().all(|tag| {
                    tags_intersect_hierarchically(contract.emits.tags.clone(), [tag.clone()])
                });

            let field_ctx = PolicyContext::new(Boundary::Action, &field_tags, call.agent_id.clone())
                .with_tool(call.tool_name.clone());
            let field_policy_ok = self.policy.evaluate(&field_ctx).action == DecisionAction::Allow;

            if identity_ok && contract_field_ok && tags_ok && field_policy_ok {
                filtered_response.insert(key.clone(), value.clone());
                kept_tags.extend(field_tags);
            } else {
                stripped_fields.push(key.clone());
                stripped_tags.extend(field_tags);
            }
        }
        kept_tags.sort();
        kept_tags.dedup();
        stripped_tags.sort();
        stripped_tags.dedup();

        let final_ctx = PolicyContext::new(Boundary::Action, &kept_tags, call.agent_id.clone())
            .with_tool(call.tool_name.clone());
        let final_decision = self.policy.evaluate(&final_ctx);

        let decision = if final_decision.action != DecisionAction::Allow {
            filtered_response.clear();
            stripped_fields = response_keys.clone();
            kept_tags.clear();
            final_decision
        } else if !stripped_fields.is_empty() {
            PolicyDecision {
                action: DecisionAction::Redact,
                policy_name: Some("tool-contract".to_string()),
                reason: "tool response fields filtered by contract/policy".to_string(),
                fallback_template: None,
            }
        } else {
            final_decision
        };

        self.finish_response(call, decision, filtered_response, response_keys, stripped_fields, stripped_tags, kept_tags)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_response(
        &self,
        call: &ToolCall,
        decision: PolicyDecision,
        filtered_response: Map<String, Value>,
        response_keys: Vec<String>,
        stripped_fields: Vec<String>,
        stripped_tags: Vec<String>,
        kept_tags: Vec<String>,
    ) -> safeai_core::Result<ResponseInterceptResult> {
        let filtered_response_keys: Vec<String> = filtered_response.keys().cloned().collect();
        let side_effects = self
            .contracts
            .get(&call.tool_name)
            .map(|c| serde_json::to_value(&c.side_effects).unwrap_or(Value::Null))
            .unwrap_or(Value::Null);

        let event = AuditEventBuilder::new(Boundary::Action, AuditAction::from(decision.action))
            .policy_name(decision.policy_name.clone().unwrap_or_default())
            .reason(decision.reason.clone())
            .data_tags(kept_tags)
            .agent_id(call.agent_id.clone())
            .tool_name(call.tool_name.clone())
            .metadata(json!({
                "phase": "response",
                "response_keys": response_keys,
                "filtered_response_keys": filtered_response_keys,
                "stripped_fields": stripped_fields,
                "stripped_tags": stripped_tags,
                "side_effects": side_effects,
            }))
            .build();
        let audit_event = self.audit.emit(event)?;
        Ok(ResponseInterceptResult {
            decision,
            filtered_response,
            response_keys,
            filtered_response_keys,
            stripped_fields,
            stripped_tags,
            audit_event,
        })
    }
}

#[cfg(test)]
mod tests {
    use safeai_contracts::{ToolContract, ToolIoSurface, ToolSideEffects, ToolStores};
    use safeai_policy::{load_path, Engine};

    use super::*;

    fn setup(dir: &tempfile::TempDir) -> ActionInterceptor {
        let policy_path = dir.path().join("policy.yaml");
        std::fs::write(
            &policy_path,
            "rules:\n  - name: allow-all\n    boundary: [action]\n    action: allow\n    reason: ok\n    priority: 1\n",
        )
        .unwrap();
        let policy = Arc::new(Engine::from_rules(load_path(&policy_path).unwrap()));

        let contract = ToolContract {
            tool_name: "search".to_string(),
            description: None,
            accepts: ToolIoSurface { tags: vec!["personal.pii".to_string()], fields: vec!["query".to_string()] },
            emits: ToolIoSurface { tags: vec!["personal.pii".to_string()], fields: Vec::new() },
            stores: ToolStores::default(),
            side_effects: ToolSideEffects::default(),
        };
        let contracts = Arc::new(ToolContractRegistry::from_contracts(vec![contract]).unwrap());
        let identities = Arc::new(AgentIdentityRegistry::new());
        let capabilities = Arc::new(CapabilityTokenManager::new());
        let approvals = Arc::new(ApprovalManager::open(dir.path().join("approvals.jsonl")).unwrap());
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();

        ActionInterceptor::new(classifier, policy, contracts, identities, capabilities, approvals, audit)
    }

    #[test]
    fn request_strips_fields_outside_contract_accepts() {
        let dir = tempfile::tempdir().unwrap();
        let interceptor = setup(&dir);
        let mut parameters = Map::new();
        parameters.insert("query".to_string(), json!("weather"));
        parameters.insert("unexpected".to_string(), json!("extra"));
        let call = ToolCall {
            tool_name: "search".to_string(),
            agent_id: "agent-1".to_string(),
            parameters,
            data_tags: Vec::new(),
            session_id: None,
            source_agent_id: None,
            destination_agent_id: None,
            action_type: None,
            capability_token_id: None,
            capability_action: "invoke".to_string(),
            approval_request_id: None,
        };

        let result = interceptor.intercept_request(&call).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Allow);
        assert!(result.filtered_params.contains_key("query"));
        assert!(!result.filtered_params.contains_key("unexpected"));
        assert!(result.stripped_fields.contains(&"unexpected".to_string()));
    }

    #[test]
    fn request_blocks_on_unknown_contract() {
        let dir = tempfile::tempdir().unwrap();
        let interceptor = setup(&dir);
        let call = ToolCall {
            tool_name: "unregistered-tool".to_string(),
            agent_id: "agent-1".to_string(),
            parameters: Map::new(),
            data_tags: Vec::new(),
            session_id: None,
            source_agent_id: None,
            destination_agent_id: None,
            action_type: None,
            capability_token_id: None,
            capability_action: "invoke".to_string(),
            approval_request_id: None,
        };

        let result = interceptor.intercept_request(&call).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Block);
        assert_eq!(result.decision.policy_name.as_deref(), Some("tool-contract"));
    }

    #[test]
    fn response_keeps_fields_within_contract_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        let interceptor = setup(&dir);
        let call = ToolCall {
            tool_name: "search".to_string(),
            agent_id: "agent-1".to_string(),
            parameters: Map::new(),
            data_tags: Vec::new(),
            session_id: None,
            source_agent_id: None,
            destination_agent_id: None,
            action_type: None,
            capability_token_id: None,
            capability_action: "invoke".to_string(),
            approval_request_id: None,
        };
        let mut response = Map::new();
        response.insert("result".to_string(), json!("sunny"));

        let result = interceptor.intercept_response(&call, &response).unwrap();
        assert_eq!(result.decision.action, DecisionAction::Allow);
        assert!(result.filtered_response.contains_key("result"));
    }
}
