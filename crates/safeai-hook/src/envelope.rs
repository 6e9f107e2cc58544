//! Stdio JSON envelope (SPEC_FULL.md §6, "Stdio hook") and the
//! pre/post-tool-use enforcement logic.
//!
//! Grounded on `original_source/safeai/cli/hook.py`'s
//! `_run_pre_tool`/`_run_post_tool`/`hook_command`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use safeai_audit::AuditLogger;
use safeai_classifier::Classifier;
use safeai_core::{Boundary, DecisionAction};
use safeai_guard::{InputScanner, OutputGuard};
use safeai_policy::{Engine as PolicyEngine, PolicyContext};

use crate::dangerous::classify_dangerous_command;
use crate::extract::{extract_text, is_shell_category};
use crate::profiles::{get_profile, resolve_tool_category, AgentProfile};

/// One `pre_tool_use` / `post_tool_use` envelope read from stdin.
#[derive(Debug, Clone, Deserialize)]
pub struct HookEnvelope {
    /// `"pre_tool_use"` or `"post_tool_use"`.
    #[serde(default)]
    pub event: Option<String>,
    /// Tool being invoked.
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    /// Request payload, for `pre_tool_use`.
    #[serde(default)]
    pub tool_input: Option<Value>,
    /// Response payload, for `post_tool_use`.
    #[serde(default)]
    pub tool_output: Option<Value>,
    /// Calling agent, defaults to `"agent"`.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    /// Session binding, when present.
    #[serde(default)]
    pub session_id: Option<String>,
}

fn default_tool_name() -> String {
    "unknown".to_string()
}

fn default_agent_id() -> String {
    "agent".to_string()
}

/// Outcome of running one hook event: whether the call is allowed and why.
#[derive(Debug, Clone)]
pub struct HookOutcome {
    /// `true` ⇒ exit 0; `false` ⇒ exit 1 with `reason` on stdout.
    pub allowed: bool,
    /// Human-readable reason, populated when blocked.
    pub reason: String,
}

fn allow() -> HookOutcome {
    HookOutcome { allowed: true, reason: String::new() }
}

fn block(reason: impl Into<String>) -> HookOutcome {
    HookOutcome { allowed: false, reason: reason.into() }
}

/// Composes the classifier/policy/audit handles needed to enforce both
/// hook phases.
pub struct HookRunner {
    input_scanner: InputScanner,
    output_guard: OutputGuard,
    policy: Arc<PolicyEngine>,
}

impl HookRunner {
    /// Builds a runner over shared classifier/policy/audit handles.
    #[must_use]
    pub fn new(classifier: Classifier, policy: Arc<PolicyEngine>, audit: Arc<AuditLogger>) -> Self {
        let output_classifier = classifier.clone();
        Self {
            input_scanner: InputScanner::new(classifier, Arc::clone(&policy), Arc::clone(&audit)),
            output_guard: OutputGuard::new(output_classifier, Arc::clone(&policy), audit),
            policy,
        }
    }

    /// Enforces `pre_tool_use` for one envelope (`original_source`'s
    /// `_run_pre_tool`): scan input for secrets/PII, tag dangerous shell
    /// commands, then evaluate the action boundary.
    pub fn run_pre_tool(
        &self,
        envelope: &HookEnvelope,
        profile_name: Option<&str>,
    ) -> safeai_core::Result<HookOutcome> {
        let profile: Option<AgentProfile> = profile_name.and_then(get_profile);
        let tool_input = envelope.tool_input.clone().unwrap_or(Value::Null);
        let text = extract_text(&envelope.tool_name, &tool_input, profile.as_ref());

        let scan = self.input_scanner.scan(&text, &envelope.agent_id)?;
        if scan.decision.action == DecisionAction::Block {
            return Ok(block(scan.decision.reason));
        }

        let mut data_tags: Vec<String> = scan.detections.iter().map(|d| d.tag.clone()).collect();
        let category = resolve_tool_category(&envelope.tool_name, profile.as_ref());
        if is_shell_category(&envelope.tool_name, category) {
            if classify_dangerous_command(&text).is_some() {
                data_tags.push("dangerous.command".to_string());
            }
        }

        if !data_tags.is_empty() {
            let ctx = PolicyContext::new(Boundary::Action, &data_tags, envelope.agent_id.clone())
                .with_tool(category.to_string());
            let decision = self.policy.evaluate(&ctx);
            if decision.action == DecisionAction::Block {
                return Ok(block(decision.reason));
            }
        }

        Ok(allow())
    }

    /// Enforces `post_tool_use` for one envelope (`original_source`'s
    /// `_run_post_tool`): guard the tool's textual output before it reaches
    /// the model.
    pub fn run_post_tool(&self, envelope: &HookEnvelope) -> safeai_core::Result<HookOutcome> {
        let Some(output) = &envelope.tool_output else { return Ok(allow()) };
        let text = match output {
            Value::String(s) => s.clone(),
            Value::Null => return Ok(allow()),
            other => other.to_string(),
        };
        if text.is_empty() {
            return Ok(allow());
        }
        let result = self.output_guard.guard(&text, &envelope.agent_id)?;
        if result.decision.action == DecisionAction::Block {
            return Ok(block(result.decision.reason));
        }
        Ok(allow())
    }
}

#[cfg(test)]
mod tests {
    use safeai_policy::{load_path, Engine};
    use serde_json::json;

    use super::*;

    fn runner(dir: &tempfile::TempDir, yaml: &str) -> HookRunner {
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, yaml).unwrap();
        let policy = Arc::new(Engine::from_rules(load_path(&path).unwrap()));
        let audit = Arc::new(AuditLogger::open(dir.path().join("audit.jsonl")).unwrap());
        let classifier = Classifier::new(&[]).unwrap();
        HookRunner::new(classifier, policy, audit)
    }

    #[test]
    fn pre_tool_blocks_on_dangerous_shell_command() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(
            &dir,
            r#"
rules:
  - name: block-dangerous
    boundary: [action]
    action: block
    reason: "dangerous command rejected"
    priority: 1
    condition:
      data_tags: dangerous.command
  - name: allow-input
    boundary: [input]
    action: allow
    reason: ok
    priority: 1000
"#,
        );
        let envelope = HookEnvelope {
            event: Some("pre_tool_use".to_string()),
            tool_name: "Bash".to_string(),
            tool_input: Some(json!({"command": "rm -rf /"})),
            tool_output: None,
            agent_id: "agent-1".to_string(),
            session_id: None,
        };
        let outcome = runner.run_pre_tool(&envelope, Some("claude-code")).unwrap();
        assert!(!outcome.allowed);
    }

    #[test]
    fn pre_tool_allows_benign_command() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(
            &dir,
            "rules:\n  - name: allow-all\n    boundary: [input, action]\n    action: allow\n    reason: ok\n    priority: 1\n",
        );
        let envelope = HookEnvelope {
            event: Some("pre_tool_use".to_string()),
            tool_name: "Bash".to_string(),
            tool_input: Some(json!({"command": "ls -la"})),
            tool_output: None,
            agent_id: "agent-1".to_string(),
            session_id: None,
        };
        let outcome = runner.run_pre_tool(&envelope, Some("claude-code")).unwrap();
        assert!(outcome.allowed);
    }

    #[test]
    fn post_tool_blocks_leaking_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(
            &dir,
            r#"
rules:
  - name: block-secrets
    boundary: [output]
    action: block
    reason: "secrets never leave the model"
    priority: 1
    condition:
      data_tags: secret.credential
"#,
        );
        let envelope = HookEnvelope {
            event: Some("post_tool_use".to_string()),
            tool_name: "Bash".to_string(),
            tool_input: None,
            tool_output: Some(json!("sk-ABCDEFGHIJKLMNOPQRSTUVWX")),
            agent_id: "agent-1".to_string(),
            session_id: None,
        };
        let outcome = runner.run_post_tool(&envelope).unwrap();
        assert!(!outcome.allowed);
    }
}
