//! Enforcement boundaries and decision actions (spec.md §3, §9 "closed enums").

use serde::{Deserialize, Serialize};

/// One of the four enforcement points an event can cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Text/structured data entering a model.
    Input,
    /// Tool/function invocations and their responses.
    Action,
    /// Text leaving a model.
    Output,
    /// Writes/reads to scoped state.
    Memory,
}

impl Boundary {
    /// Lowercase wire name, e.g. `"input"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Action => "action",
            Self::Output => "output",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Boundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "action" => Ok(Self::Action),
            "output" => Ok(Self::Output),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown boundary '{other}'")),
        }
    }
}

/// The four-way decision every boundary pipeline reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Proceed unchanged.
    Allow,
    /// Proceed with detected spans/fields removed or replaced.
    Redact,
    /// Refuse the operation entirely.
    Block,
    /// Gate on a durable human decision before proceeding.
    RequireApproval,
}

impl DecisionAction {
    /// Lowercase wire name, e.g. `"require_approval"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Redact => "redact",
            Self::Block => "block",
            Self::RequireApproval => "require_approval",
        }
    }

    /// True for `Block`, `Redact`, and `RequireApproval` — the "final gate"
    /// set in spec.md §4.12 step 7 that zeroes out filtered payloads.
    #[must_use]
    pub fn is_non_allow(self) -> bool {
        !matches!(self, Self::Allow)
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra audit-only actions recorded for approval decisions and memory
/// retention, beyond the four boundary `DecisionAction`s (spec.md §3
/// `AuditEvent.action`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Mirrors `DecisionAction::Allow`.
    Allow,
    /// Mirrors `DecisionAction::Redact`.
    Redact,
    /// Mirrors `DecisionAction::Block`.
    Block,
    /// Mirrors `DecisionAction::RequireApproval`.
    RequireApproval,
    /// An approval request was approved.
    Approve,
    /// An approval request was denied.
    Deny,
}

impl From<DecisionAction> for AuditAction {
    fn from(action: DecisionAction) -> Self {
        match action {
            DecisionAction::Allow => Self::Allow,
            DecisionAction::Redact => Self::Redact,
            DecisionAction::Block => Self::Block,
            DecisionAction::RequireApproval => Self::RequireApproval,
        }
    }
}

impl AuditAction {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Redact => "redact",
            Self::Block => "block",
            Self::RequireApproval => "require_approval",
            Self::Approve => "approve",
            Self::Deny => "deny",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
