//! `PolicyDecision` and the default-deny fallback (spec.md §3).

use serde::{Deserialize, Serialize};

use crate::boundary::DecisionAction;

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// The chosen action.
    pub action: DecisionAction,
    /// Name of the rule that produced this decision, `None` for default-deny
    /// or for decisions synthesized outside the rule list (contract/identity/
    /// capability/approval gates carry their own fixed names instead).
    pub policy_name: Option<String>,
    /// Human-readable reason.
    pub reason: String,
    /// Output-boundary fallback rendering template, if the rule declared one.
    pub fallback_template: Option<String>,
}

impl PolicyDecision {
    /// The fixed default-deny decision returned when no rule matches
    /// (spec.md §3 "Default-deny decision").
    #[must_use]
    pub fn default_deny() -> Self {
        Self {
            action: DecisionAction::Block,
            policy_name: None,
            reason: "default deny".to_string(),
            fallback_template: None,
        }
    }

    /// Build a decision synthesized by a non-policy gate (contract, identity,
    /// capability, approval) — always `block` with a fixed `policy_name`.
    #[must_use]
    pub fn synthesized_block(policy_name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Block,
            policy_name: Some(policy_name.to_string()),
            reason: reason.into(),
            fallback_template: None,
        }
    }

    /// True if this decision is a member of the "final gate" set that zeroes
    /// out filtered payloads (spec.md §4.12 step 7).
    #[must_use]
    pub fn is_non_allow(&self) -> bool {
        self.action.is_non_allow()
    }
}
