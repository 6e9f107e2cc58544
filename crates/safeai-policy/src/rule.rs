//! `PolicyRule` and the YAML/JSON document it is loaded from.
//!
//! Grounded on `original_source/safeai/core/policy.py` (`PolicyRule`,
//! `normalize_rules`) and on the ORCA `policy::Rule`/`PolicyFile` shape for
//! how a rule document deserializes.

use serde::{Deserialize, Serialize};

use safeai_core::{normalize_tag, Boundary, DecisionAction};

/// Accepts either a bare string or a list of strings in YAML/JSON, always
/// normalizing to a `Vec<String>`. Mirrors the original's "string is
/// normalized to one-element list" condition-key rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(v: OneOrMany) -> Self {
        match v {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

fn deserialize_one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(opt.map(Vec::from))
}

/// Condition under which a [`PolicyRule`] matches a [`crate::PolicyContext`].
///
/// A missing key matches anything; a present key must intersect (for
/// `data_tags`, hierarchically) the corresponding context field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Condition {
    /// Tag set to intersect against the expanded context tags.
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub data_tags: Option<Vec<String>>,
    /// Tool name set; `context.tool_name` must be a member.
    #[serde(default, alias = "tool", deserialize_with = "deserialize_one_or_many")]
    pub tools: Option<Vec<String>>,
    /// Agent id set; `context.agent_id` must be a member.
    #[serde(default, alias = "agent", deserialize_with = "deserialize_one_or_many")]
    pub agents: Option<Vec<String>>,
}

fn default_priority() -> i64 {
    100
}

/// A single policy rule (spec.md §3 `PolicyRule`).
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRule {
    /// Unique, human-readable rule name.
    pub name: String,
    /// Boundaries this rule applies to; memory uses a separate synthetic
    /// policy name rather than appearing here.
    pub boundary: Vec<Boundary>,
    /// Decision this rule produces when matched.
    pub action: DecisionAction,
    /// Human-readable explanation surfaced on the decision.
    pub reason: String,
    /// Match condition.
    #[serde(default)]
    pub condition: Condition,
    /// Lower runs first; ties break by insertion (file) order. Defaults to
    /// `100` when omitted from a loaded document (`SPEC_FULL.md` §3).
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Template used by the output guard fallback rendering.
    #[serde(default)]
    pub fallback_template: Option<String>,
}

/// On-disk policy document: `{version, rules}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyDocument {
    /// Schema version tag, e.g. `"v1alpha1"`.
    #[serde(default)]
    pub version: Option<String>,
    /// Declarative list of rules, in file order.
    pub rules: Vec<serde_json::Value>,
}

/// Parses and normalizes one raw rule value, lowercasing its tag condition
/// and rejecting an empty name.
pub fn normalize_rule(raw: serde_json::Value) -> safeai_core::Result<PolicyRule> {
    let mut rule: PolicyRule = serde_json::from_value(raw)
        .map_err(|e| safeai_core::SafeAiError::Validation(e.to_string()))?;
    if rule.name.trim().is_empty() {
        return Err(safeai_core::SafeAiError::Validation(
            "rule name must be non-empty".into(),
        ));
    }
    if let Some(tags) = rule.condition.data_tags.take() {
        let normalized: Vec<String> = tags.iter().filter_map(|t| normalize_tag(t)).collect();
        rule.condition.data_tags = Some(normalized);
    }
    Ok(rule)
}
