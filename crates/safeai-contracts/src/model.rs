//! `ToolContract` document model (spec.md §3 `ToolContract`).
//!
//! Grounded on `original_source/safeai/core/contracts.py`'s
//! `ToolContract`/`ToolSideEffects` dataclasses and
//! `original_source/safeai/core/models.py`'s `ToolContractDocumentModel`.

use serde::{Deserialize, Serialize};

use safeai_core::normalize_tag;

/// Accepted or emitted tag/field surface for one direction of a tool call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolIoSurface {
    /// Tags authorized for this direction. Stored lowercase.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Field allow-list. Empty means "no field filtering — all allowed."
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Declared persistent storage surface for a tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolStores {
    /// Fields the tool is declared to persist.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Retention duration string, if declared.
    #[serde(default)]
    pub retention: Option<String>,
}

/// Declared side effects of invoking a tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolSideEffects {
    /// Whether the side effect can be undone.
    #[serde(default)]
    pub reversible: bool,
    /// Whether invocation always requires a human approval, regardless of
    /// policy outcome.
    #[serde(default)]
    pub requires_approval: bool,
    /// Free-form description surfaced in audit metadata.
    #[serde(default)]
    pub description: Option<String>,
}

/// One tool's declared capability contract.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolContract {
    /// Canonical tool name, matched against `ToolCall.tool_name`.
    pub tool_name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tags/fields the tool accepts on the request side.
    #[serde(default)]
    pub accepts: ToolIoSurface,
    /// Tags/fields the tool emits on the response side.
    #[serde(default)]
    pub emits: ToolIoSurface,
    /// Persistent storage surface, if the tool stores anything.
    #[serde(default)]
    pub stores: ToolStores,
    /// Declared side effects.
    #[serde(default)]
    pub side_effects: ToolSideEffects,
}

impl ToolContract {
    fn normalize(mut self) -> safeai_core::Result<Self> {
        if self.tool_name.trim().is_empty() {
            return Err(safeai_core::SafeAiError::Validation(
                "tool_name must be non-empty".into(),
            ));
        }
        self.accepts.tags = self.accepts.tags.iter().filter_map(|t| normalize_tag(t)).collect();
        self.emits.tags = self.emits.tags.iter().filter_map(|t| normalize_tag(t)).collect();
        Ok(self)
    }
}

/// Document envelope a contract file deserializes from: `{version, tools}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolContractDocument {
    /// Schema version tag, e.g. `"v1alpha1"`.
    #[serde(default)]
    pub version: Option<String>,
    /// Declared contracts, in file order.
    pub tools: Vec<ToolContract>,
}

/// Normalizes a batch of parsed contracts, rejecting duplicate tool names
/// (mirrors `normalize_contracts()`).
pub fn normalize_contracts(raw: Vec<ToolContract>) -> safeai_core::Result<Vec<ToolContract>> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for contract in raw {
        let contract = contract.normalize()?;
        if !seen.insert(contract.tool_name.clone()) {
            return Err(safeai_core::SafeAiError::Validation(format!(
                "duplicate tool contract for '{}'",
                contract.tool_name
            )));
        }
        out.push(contract);
    }
    Ok(out)
}
