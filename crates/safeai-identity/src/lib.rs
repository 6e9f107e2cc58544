//! Agent identity registry (spec component C6).
//!
//! Grounded on `original_source/safeai/core/identity.py`'s
//! `AgentIdentityRegistry` (`load`/`get`/`has`/`all`/`validate`,
//! `normalize_agent_identities`) and `models.py`'s
//! `AgentIdentityDocumentModel`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use safeai_core::{normalize_tag, tags_intersect_hierarchically, Result, SafeAiError};

/// One agent's declared identity: what it may invoke and what data it is
/// cleared to see.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentIdentity {
    /// Unique agent id.
    pub agent_id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tools this agent may invoke. Empty means tool binding is not
    /// enforced.
    #[serde(default)]
    pub tools: HashSet<String>,
    /// Tags this agent is cleared to see. Empty means clearance is not
    /// enforced.
    #[serde(default)]
    pub clearance_tags: HashSet<String>,
}

/// Document envelope an identity file deserializes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentIdentityDocument {
    /// Schema version tag, e.g. `"v1alpha1"`.
    #[serde(default)]
    pub version: Option<String>,
    /// Declared identities, in file order.
    pub agents: Vec<AgentIdentity>,
}

/// Outcome of [`AgentIdentityRegistry::validate`].
#[derive(Debug, Clone)]
pub struct AgentIdentityValidationResult {
    /// Whether the agent is authorized for the tool/tags.
    pub allowed: bool,
    /// Human-readable reason.
    pub reason: String,
    /// Tags found unauthorized, collected rather than short-circuited.
    pub unauthorized_tags: Vec<String>,
}

fn normalize_identity(mut identity: AgentIdentity) -> Result<AgentIdentity> {
    if identity.agent_id.trim().is_empty() {
        return Err(SafeAiError::Validation("agent_id must be non-empty".into()));
    }
    identity.clearance_tags =
        identity.clearance_tags.iter().filter_map(|t| normalize_tag(t)).collect();
    Ok(identity)
}

/// Normalizes a batch of parsed identities, rejecting duplicate agent ids.
pub fn normalize_agent_identities(raw: Vec<AgentIdentity>) -> Result<Vec<AgentIdentity>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for identity in raw {
        let identity = normalize_identity(identity)?;
        if !seen.insert(identity.agent_id.clone()) {
            return Err(SafeAiError::Validation(format!(
                "duplicate agent identity for '{}'",
                identity.agent_id
            )));
        }
        out.push(identity);
    }
    Ok(out)
}

/// In-memory registry of declared [`AgentIdentity`]s.
#[derive(Debug, Clone, Default)]
pub struct AgentIdentityRegistry {
    identities: HashMap<String, AgentIdentity>,
}

impl AgentIdentityRegistry {
    /// An empty registry. Per spec.md §4.6, an empty registry allows any
    /// agent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from already-parsed identities.
    pub fn from_identities(identities: Vec<AgentIdentity>) -> Result<Self> {
        let identities = normalize_agent_identities(identities)?;
        Ok(Self { identities: identities.into_iter().map(|i| (i.agent_id.clone(), i)).collect() })
    }

    /// Loads a YAML or JSON identity document from disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let doc: AgentIdentityDocument =
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                serde_json::from_str(&text).map_err(|e| SafeAiError::Config(e.to_string()))?
            } else {
                serde_yaml::from_str(&text).map_err(|e| SafeAiError::Config(e.to_string()))?
            };
        Self::from_identities(doc.agents)
    }

    /// Looks up an identity by agent id.
    #[must_use]
    pub fn get(&self, agent_id: &str) -> Option<&AgentIdentity> {
        self.identities.get(agent_id)
    }

    /// Whether an identity is declared for `agent_id`.
    #[must_use]
    pub fn has(&self, agent_id: &str) -> bool {
        self.identities.contains_key(agent_id)
    }

    /// All declared identities.
    pub fn all(&self) -> impl Iterator<Item = &AgentIdentity> {
        self.identities.values()
    }

    /// Validates that `agent_id` may use `tool_name` (when supplied) and is
    /// cleared for `data_tags` (spec.md §4.6).
    #[must_use]
    pub fn validate(
        &self,
        agent_id: &str,
        tool_name: Option<&str>,
        data_tags: &[String],
    ) -> AgentIdentityValidationResult {
        if self.identities.is_empty() {
            return AgentIdentityValidationResult {
                allowed: true,
                reason: "identity registry is empty; allowing by default".to_string(),
                unauthorized_tags: Vec::new(),
            };
        }
        let Some(identity) = self.get(agent_id) else {
            return AgentIdentityValidationResult {
                allowed: false,
                reason: format!("agent '{agent_id}' has no declared identity"),
                unauthorized_tags: Vec::new(),
            };
        };
        if let Some(tool) = tool_name {
            if !identity.tools.is_empty() && !identity.tools.contains(tool) {
                return AgentIdentityValidationResult {
                    allowed: false,
                    reason: format!("agent '{agent_id}' is not bound to tool '{tool}'"),
                    unauthorized_tags: Vec::new(),
                };
            }
        }
        if identity.clearance_tags.is_empty() {
            return AgentIdentityValidationResult { allowed: true, reason: String::new(), unauthorized_tags: Vec::new() };
        }
        let mut unauthorized = Vec::new();
        for tag in data_tags {
            let Some(tag) = normalize_tag(tag) else { continue };
            if !tags_intersect_hierarchically(identity.clearance_tags.clone(), [tag.clone()]) {
                unauthorized.push(tag);
            }
        }
        if unauthorized.is_empty() {
            AgentIdentityValidationResult { allowed: true, reason: String::new(), unauthorized_tags: Vec::new() }
        } else {
            AgentIdentityValidationResult {
                allowed: false,
                reason: format!(
                    "agent '{agent_id}' is not cleared for tags: {}",
                    unauthorized.join(", ")
                ),
                unauthorized_tags: unauthorized,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AgentIdentity {
        AgentIdentity {
            agent_id: "agent-1".to_string(),
            description: None,
            tools: ["search".to_string()].into_iter().collect(),
            clearance_tags: ["personal.pii".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn empty_registry_allows_any_agent() {
        let registry = AgentIdentityRegistry::new();
        let result = registry.validate("anyone", None, &["secret.credential".to_string()]);
        assert!(result.allowed);
    }

    #[test]
    fn missing_agent_blocks() {
        let registry = AgentIdentityRegistry::from_identities(vec![sample()]).unwrap();
        let result = registry.validate("unknown", None, &[]);
        assert!(!result.allowed);
    }

    #[test]
    fn tool_binding_enforced_when_declared() {
        let registry = AgentIdentityRegistry::from_identities(vec![sample()]).unwrap();
        let result = registry.validate("agent-1", Some("other-tool"), &[]);
        assert!(!result.allowed);
        let result = registry.validate("agent-1", Some("search"), &[]);
        assert!(result.allowed);
    }

    #[test]
    fn clearance_uses_ancestor_matching() {
        let registry = AgentIdentityRegistry::from_identities(vec![sample()]).unwrap();
        let result = registry.validate("agent-1", None, &["personal.pii.ssn".to_string()]);
        assert!(result.allowed);
        let result = registry.validate("agent-1", None, &["secret.credential".to_string()]);
        assert!(!result.allowed);
    }
}
