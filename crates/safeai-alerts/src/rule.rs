//! `AlertRule` and its match filters (spec.md §3 `AlertRule`).
//!
//! Grounded on `original_source/safeai/dashboard/service.py`'s `AlertRule`
//! dataclass and `AlertRuleManager._matches_rule`/`_parse_alert_rule`.

use serde::{Deserialize, Serialize};

use safeai_core::{expand_tags, AuditAction, Boundary};

/// Filter set an audit event must satisfy to count toward a rule's window.
/// Every field is optional; a missing filter matches anything.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertFilters {
    /// Restrict to these boundaries.
    #[serde(default)]
    pub boundaries: Vec<Boundary>,
    /// Restrict to these actions.
    #[serde(default)]
    pub actions: Vec<AuditAction>,
    /// Restrict to these policy names.
    #[serde(default)]
    pub policies: Vec<String>,
    /// Restrict to these agent ids.
    #[serde(default)]
    pub agents: Vec<String>,
    /// Restrict to events whose expanded tag set intersects these tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AlertFilters {
    /// True iff `event` satisfies every configured filter (spec.md §4.14
    /// "Match predicate").
    #[must_use]
    pub fn matches(&self, event: &safeai_audit::AuditEvent) -> bool {
        if !self.boundaries.is_empty() && !self.boundaries.contains(&event.boundary) {
            return false;
        }
        if !self.actions.is_empty() && !self.actions.contains(&event.action) {
            return false;
        }
        if !self.policies.is_empty() {
            let Some(name) = &event.policy_name else { return false };
            if !self.policies.iter().any(|p| p == name) {
                return false;
            }
        }
        if !self.agents.is_empty() && !self.agents.iter().any(|a| a == &event.agent_id) {
            return false;
        }
        if !self.tags.is_empty() {
            let expanded = expand_tags(&event.data_tags);
            let filter_expanded = expand_tags(&self.tags);
            if filter_expanded.is_disjoint(&expanded) {
                return false;
            }
        }
        true
    }
}

/// A threshold alert rule: fire once the sliding window holds at least
/// `threshold` matching events, gated by `cooldown` between firings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertRule {
    /// Unique rule id.
    pub rule_id: String,
    /// Human-readable name.
    pub name: String,
    /// Minimum matching event count within the window to fire.
    pub threshold: u64,
    /// Compact duration string bounding the sliding window (`"30s"` .. `"2w"`).
    pub window: String,
    /// Minimum compact duration between two firings of this rule. Defaults
    /// to `"0s"` (no cooldown) when omitted.
    #[serde(default = "default_cooldown")]
    pub cooldown: String,
    /// Match condition.
    #[serde(default)]
    pub filters: AlertFilters,
    /// Named channels this rule dispatches to on firing.
    #[serde(default)]
    pub channels: Vec<String>,
}

fn default_cooldown() -> String {
    "0s".to_string()
}

/// On-disk alert rule document: `{version, alert_rules}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertRuleDocument {
    /// Schema version tag, e.g. `"v1alpha1"`.
    #[serde(default)]
    pub version: Option<String>,
    /// Declared rules, in file order.
    pub alert_rules: Vec<AlertRule>,
}
