//! `AuditEvent` — the immutable record every boundary call appends
//! (spec.md §3).
//!
//! Grounded on `original_source/safeai/core/models.py`'s `AuditEventModel`
//! and `original_source/safeai/core/audit.py`'s `context_hash()`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use safeai_core::{context_hash, expand_tags, new_event_id, AuditAction, Boundary};

/// One append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// `"evt_"` + 12 lowercase hex.
    pub event_id: String,
    /// ISO-8601 UTC timestamp, set at emission time.
    pub timestamp: String,
    /// Enforcement boundary this event crossed.
    pub boundary: Boundary,
    /// Decision (or approval-workflow transition) this event records.
    pub action: AuditAction,
    /// Name of the policy/gate that produced the decision, if any.
    #[serde(default)]
    pub policy_name: Option<String>,
    /// Human-readable explanation.
    pub reason: String,
    /// Raw (unexpanded) tags associated with the event's payload.
    #[serde(default)]
    pub data_tags: Vec<String>,
    /// Agent responsible for the event.
    pub agent_id: String,
    /// Tool invoked, for action-boundary events.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Session binding, when present.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Originating agent, for agent-to-agent messages.
    #[serde(default)]
    pub source_agent_id: Option<String>,
    /// Destination agent, for agent-to-agent messages.
    #[serde(default)]
    pub destination_agent_id: Option<String>,
    /// `"sha256:"` + 64 hex, computed over the canonical projection of every
    /// other semantically-identifying field.
    pub context_hash: String,
    /// Free-form structured metadata (e.g. `decision_source`, `phase`).
    #[serde(default)]
    pub metadata: Value,
}

/// Builder for a not-yet-hashed, not-yet-timestamped event. Call
/// [`AuditEventBuilder::build`] to stamp the timestamp and compute the
/// `context_hash` over the remaining fields.
#[derive(Debug, Clone, Default)]
pub struct AuditEventBuilder {
    boundary: Option<Boundary>,
    action: Option<AuditAction>,
    policy_name: Option<String>,
    reason: String,
    data_tags: Vec<String>,
    agent_id: String,
    tool_name: Option<String>,
    session_id: Option<String>,
    source_agent_id: Option<String>,
    destination_agent_id: Option<String>,
    metadata: Value,
}

impl AuditEventBuilder {
    /// Starts a new builder for the given boundary and action.
    #[must_use]
    pub fn new(boundary: Boundary, action: AuditAction) -> Self {
        Self {
            boundary: Some(boundary),
            action: Some(action),
            metadata: json!({}),
            ..Default::default()
        }
    }

    /// Sets the policy/gate name (builder style).
    #[must_use]
    pub fn policy_name(mut self, name: impl Into<String>) -> Self {
        self.policy_name = Some(name.into());
        self
    }

    /// Sets the human-readable reason (builder style).
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets the data tag list (builder style).
    #[must_use]
    pub fn data_tags(mut self, tags: Vec<String>) -> Self {
        self.data_tags = tags;
        self
    }

    /// Sets the responsible agent id (builder style).
    #[must_use]
    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    /// Sets the tool name (builder style).
    #[must_use]
    pub fn tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Sets the session id (builder style).
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the source agent id for an agent-to-agent event (builder style).
    #[must_use]
    pub fn source_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.source_agent_id = Some(agent_id.into());
        self
    }

    /// Sets the destination agent id for an agent-to-agent event (builder
    /// style).
    #[must_use]
    pub fn destination_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.destination_agent_id = Some(agent_id.into());
        self
    }

    /// Sets arbitrary structured metadata (builder style).
    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Stamps the timestamp and computes `context_hash` over every other
    /// field, producing the final immutable [`AuditEvent`].
    #[must_use]
    pub fn build(self) -> AuditEvent {
        let event_id = new_event_id();
        let boundary = self.boundary.expect("boundary is required");
        let action = self.action.expect("action is required");
        let projection = json!({
            "event_id": event_id,
            "boundary": boundary,
            "action": action,
            "policy_name": self.policy_name.clone(),
            "reason": self.reason.clone(),
            "data_tags": expand_tags(&self.data_tags).into_iter().collect::<Vec<_>>(),
            "agent_id": self.agent_id.clone(),
            "tool_name": self.tool_name.clone(),
            "session_id": self.session_id.clone(),
            "source_agent_id": self.source_agent_id.clone(),
            "destination_agent_id": self.destination_agent_id.clone(),
            "metadata": self.metadata.clone(),
        });
        AuditEvent {
            event_id,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            boundary,
            action,
            policy_name: self.policy_name,
            reason: self.reason,
            data_tags: self.data_tags,
            agent_id: self.agent_id,
            tool_name: self.tool_name,
            session_id: self.session_id,
            source_agent_id: self.source_agent_id,
            destination_agent_id: self.destination_agent_id,
            context_hash: context_hash(&projection),
            metadata: self.metadata,
        }
    }
}
