//! Capability token manager (spec component C7): issue/validate/revoke
//! scoped, TTL'd, session-bound tokens.
//!
//! Grounded on `original_source/safeai/secrets/capability.py`'s
//! `CapabilityTokenManager` and `models.py`'s `CapabilityTokenModel`
//! (`token_id` pattern `^cap_[a-z0-9]{12,}$`).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use safeai_core::{
    new_capability_token_id, parse_duration, system_clock, Result, SafeAiError, SharedClock,
};

/// What a capability token authorizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityScope {
    /// Tool this token is valid for.
    pub tool_name: String,
    /// Actions authorized on that tool (lowercased, deduped).
    pub actions: HashSet<String>,
    /// Secret keys this token grants access to, via the secret manager.
    #[serde(default)]
    pub secret_keys: HashSet<String>,
}

/// A short-lived, scoped credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityToken {
    /// `"cap_"` + 24 lowercase hex.
    pub token_id: String,
    /// Agent this token was issued to.
    pub agent_id: String,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// Expiry time; always `> issued_at`.
    pub expires_at: DateTime<Utc>,
    /// Session binding, enforced only when present.
    #[serde(default)]
    pub session_id: Option<String>,
    /// What this token authorizes.
    pub scope: CapabilityScope,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Revocation time, if revoked before natural expiry.
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl CapabilityToken {
    /// Active iff not revoked and `now < expires_at` (spec.md §3).
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

/// Outcome of [`CapabilityTokenManager::validate`].
#[derive(Debug, Clone)]
pub struct CapabilityValidationResult {
    /// Whether the token authorizes this exact `(agent, tool, action,
    /// session)` tuple right now.
    pub allowed: bool,
    /// Human-readable reason.
    pub reason: String,
}

fn allow() -> CapabilityValidationResult {
    CapabilityValidationResult { allowed: true, reason: String::new() }
}

fn deny(reason: impl Into<String>) -> CapabilityValidationResult {
    CapabilityValidationResult { allowed: false, reason: reason.into() }
}

/// In-memory `token_id -> CapabilityToken` map with an injectable clock.
pub struct CapabilityTokenManager {
    tokens: Mutex<HashMap<String, CapabilityToken>>,
    clock: SharedClock,
}

impl Default for CapabilityTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityTokenManager {
    /// Builds a manager using the system wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Builds a manager using an injected clock (tests, replay).
    #[must_use]
    pub fn with_clock(clock: SharedClock) -> Self {
        Self { tokens: Mutex::new(HashMap::new()), clock }
    }

    /// Issues a new token. `ttl` follows the compact duration grammar
    /// (`^\d+[smhdw]$`); an invalid grammar or empty `actions` is an error.
    pub fn issue(
        &self,
        agent_id: impl Into<String>,
        tool_name: impl Into<String>,
        actions: impl IntoIterator<Item = String>,
        ttl: &str,
        secret_keys: impl IntoIterator<Item = String>,
        session_id: Option<String>,
        metadata: serde_json::Value,
    ) -> Result<CapabilityToken> {
        let actions: HashSet<String> = actions.into_iter().map(|a| a.to_lowercase()).collect();
        if actions.is_empty() {
            return Err(SafeAiError::Validation("actions must be non-empty".into()));
        }
        let ttl_secs = parse_duration(ttl)?.as_secs();
        let issued_at = self.clock.now();
        let expires_at = issued_at + chrono::Duration::seconds(ttl_secs as i64);
        if expires_at <= issued_at {
            return Err(SafeAiError::Validation("expires_at must be after issued_at".into()));
        }
        let token = CapabilityToken {
            token_id: new_capability_token_id(),
            agent_id: agent_id.into(),
            issued_at,
            expires_at,
            session_id,
            scope: CapabilityScope {
                tool_name: tool_name.into(),
                actions,
                secret_keys: secret_keys.into_iter().map(|k| k.to_lowercase()).collect(),
            },
            metadata,
            revoked_at: None,
        };
        self.tokens.lock().expect("capability map lock poisoned").insert(token.token_id.clone(), token.clone());
        Ok(token)
    }

    /// Looks up a token by id, regardless of its active state.
    #[must_use]
    pub fn get(&self, token_id: &str) -> Option<CapabilityToken> {
        self.tokens.lock().expect("capability map lock poisoned").get(token_id).cloned()
    }

    /// Validates that `token_id` authorizes `(agent_id, tool_name, action)`,
    /// with `session_id` enforced only when the token carries one
    /// (spec.md §4.7, §8 invariant 6: monotonic in time).
    #[must_use]
    pub fn validate(
        &self,
        token_id: &str,
        agent_id: &str,
        tool_name: &str,
        action: &str,
        session_id: Option<&str>,
    ) -> CapabilityValidationResult {
        let Some(token) = self.get(token_id) else {
            return deny(format!("capability token '{token_id}' does not exist"));
        };
        let now = self.clock.now();
        if token.revoked_at.is_some() {
            return deny(format!("capability token '{token_id}' has been revoked"));
        }
        if now >= token.expires_at {
            return deny(format!("capability token '{token_id}' has expired"));
        }
        if token.agent_id != agent_id {
            return deny("capability token is not bound to this agent");
        }
        if token.scope.tool_name != tool_name {
            return deny("capability token is not scoped to this tool");
        }
        if !token.scope.actions.contains(&action.to_lowercase()) {
            return deny(format!("capability token does not authorize action '{action}'"));
        }
        if let Some(bound_session) = &token.session_id {
            if session_id != Some(bound_session.as_str()) {
                return deny("capability token session binding does not match");
            }
        }
        allow()
    }

    /// Revokes a token immediately. No-op if already revoked or unknown.
    pub fn revoke(&self, token_id: &str) {
        let mut guard = self.tokens.lock().expect("capability map lock poisoned");
        if let Some(token) = guard.get_mut(token_id) {
            if token.revoked_at.is_none() {
                token.revoked_at = Some(self.clock.now());
            }
        }
    }

    /// Drops every token whose `expires_at` has elapsed. Expired tokens stay
    /// in the map until this runs (spec.md §4.7).
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.tokens.lock().expect("capability map lock poisoned");
        let before = guard.len();
        guard.retain(|_, token| now < token.expires_at);
        before - guard.len()
    }

    /// Lists every currently-active (not revoked, not expired) token.
    #[must_use]
    pub fn list_active(&self) -> Vec<CapabilityToken> {
        let now = self.clock.now();
        self.tokens
            .lock()
            .expect("capability map lock poisoned")
            .values()
            .filter(|t| t.is_active(now))
            .cloned()
            .collect()
    }
}
