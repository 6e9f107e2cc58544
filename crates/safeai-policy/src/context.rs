//! `PolicyContext` — the input to [`crate::Engine::evaluate`].

use std::collections::BTreeSet;

use safeai_core::Boundary;

/// Everything a policy evaluation needs about the event under scrutiny.
///
/// Grounded on `original_source/safeai/core/policy.py`'s `PolicyContext`.
#[derive(Debug, Clone)]
pub struct PolicyContext {
    /// Which enforcement boundary this event crosses.
    pub boundary: Boundary,
    /// Already-expanded (hierarchical) tag set for the event's payload.
    pub data_tags: BTreeSet<String>,
    /// Agent performing the action.
    pub agent_id: String,
    /// Tool being invoked, when `boundary == Action`.
    pub tool_name: Option<String>,
    /// Free-form action type discriminator (reserved for rule authors).
    pub action_type: Option<String>,
}

impl PolicyContext {
    /// Builds a context from raw (unexpanded) tags, expanding them via
    /// `safeai_core::expand_tags`.
    #[must_use]
    pub fn new(boundary: Boundary, raw_tags: &[String], agent_id: impl Into<String>) -> Self {
        Self {
            boundary,
            data_tags: safeai_core::expand_tags(raw_tags),
            agent_id: agent_id.into(),
            tool_name: None,
            action_type: None,
        }
    }

    /// Attaches a tool name (builder style).
    #[must_use]
    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Attaches an action type (builder style).
    #[must_use]
    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }
}
