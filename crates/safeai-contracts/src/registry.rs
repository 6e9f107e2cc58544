//! `ToolContractRegistry` — request validation against declared contracts
//! (spec.md §4.5).

use std::collections::HashMap;

use safeai_core::{normalize_tag, tags_intersect_hierarchically, Result};

use crate::model::{normalize_contracts, ToolContract, ToolContractDocument};

/// Outcome of [`ToolContractRegistry::validate_request`].
#[derive(Debug, Clone)]
pub struct ContractValidationResult {
    /// Whether the request is authorized.
    pub allowed: bool,
    /// Human-readable reason.
    pub reason: String,
    /// Every requested tag found unauthorized, collected (not short-circuited).
    pub unauthorized_tags: Vec<String>,
}

/// In-memory registry of declared [`ToolContract`]s, keyed by tool name.
#[derive(Debug, Clone, Default)]
pub struct ToolContractRegistry {
    contracts: HashMap<String, ToolContract>,
}

impl ToolContractRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from already-normalized contracts.
    pub fn from_contracts(contracts: Vec<ToolContract>) -> Result<Self> {
        let contracts = normalize_contracts(contracts)?;
        Ok(Self {
            contracts: contracts.into_iter().map(|c| (c.tool_name.clone(), c)).collect(),
        })
    }

    /// Loads a YAML or JSON contract document from disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let doc: ToolContractDocument =
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                serde_json::from_str(&text)
                    .map_err(|e| safeai_core::SafeAiError::Config(e.to_string()))?
            } else {
                serde_yaml::from_str(&text)
                    .map_err(|e| safeai_core::SafeAiError::Config(e.to_string()))?
            };
        Self::from_contracts(doc.tools)
    }

    /// Looks up a contract by tool name.
    #[must_use]
    pub fn get(&self, tool_name: &str) -> Option<&ToolContract> {
        self.contracts.get(tool_name)
    }

    /// Whether a contract is declared for `tool_name`.
    #[must_use]
    pub fn has(&self, tool_name: &str) -> bool {
        self.contracts.contains_key(tool_name)
    }

    /// All declared contracts.
    pub fn all(&self) -> impl Iterator<Item = &ToolContract> {
        self.contracts.values()
    }

    /// Validates an incoming request's tags against the tool's declared
    /// `accepts.tags` (spec.md §4.5).
    #[must_use]
    pub fn validate_request(&self, tool_name: &str, data_tags: &[String]) -> ContractValidationResult {
        let Some(contract) = self.get(tool_name) else {
            return ContractValidationResult {
                allowed: false,
                reason: format!("tool '{tool_name}' has no declared contract"),
                unauthorized_tags: data_tags.iter().filter_map(|t| normalize_tag(t)).collect(),
            };
        };
        if data_tags.is_empty() {
            return ContractValidationResult { allowed: true, reason: String::new(), unauthorized_tags: Vec::new() };
        }
        let mut unauthorized = Vec::new();
        for tag in data_tags {
            let Some(tag) = normalize_tag(tag) else { continue };
            if !tags_intersect_hierarchically(contract.accepts.tags.clone(), [tag.clone()]) {
                unauthorized.push(tag);
            }
        }
        if unauthorized.is_empty() {
            ContractValidationResult { allowed: true, reason: String::new(), unauthorized_tags: Vec::new() }
        } else {
            ContractValidationResult {
                allowed: false,
                reason: format!(
                    "tool '{tool_name}' contract does not authorize tags: {}",
                    unauthorized.join(", ")
                ),
                unauthorized_tags: unauthorized,
            }
        }
    }
}
