//! `MemoryController` (spec.md §4.13).
//!
//! Grounded on `original_source/safeai/core/memory.py`'s
//! `MemoryController` (`write`/`read`/`purge`/`purge_expired`,
//! `_compute_expiry`, `_matches_declared_type`).

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

use safeai_audit::{AuditEventBuilder, AuditLogger};
use safeai_core::{parse_duration, system_clock, AuditAction, Boundary, SharedClock};
use safeai_policy::{Engine as PolicyEngine, PolicyContext};

use crate::model::{MemoryEntry, MemorySchema};

/// A weak reference to an encrypted entry, returned from `read` in place
/// of the plaintext value.
#[derive(Debug, Clone)]
struct Handle {
    owner_agent_id: String,
    tag: String,
    entry_expires_at: chrono::DateTime<chrono::Utc>,
    key: String,
}

/// Schema-bound, per-agent memory store.
pub struct MemoryController {
    schema: MemorySchema,
    data: Mutex<HashMap<String, HashMap<String, MemoryEntry>>>,
    handles: Mutex<HashMap<String, Handle>>,
    clock: SharedClock,
}

impl MemoryController {
    /// Builds a controller enforcing `schema`, using the system clock.
    #[must_use]
    pub fn new(schema: MemorySchema) -> Self {
        Self::with_clock(schema, system_clock())
    }

    /// Builds a controller with an injected clock (tests).
    #[must_use]
    pub fn with_clock(schema: MemorySchema, clock: SharedClock) -> Self {
        Self { schema, data: Mutex::new(HashMap::new()), handles: Mutex::new(HashMap::new()), clock }
    }

    /// The schema this controller enforces.
    #[must_use]
    pub fn schema(&self) -> &MemorySchema {
        &self.schema
    }

    /// Writes `value` under `key` for `agent_id`. Returns `false` if `key`
    /// is not declared, the value's runtime type doesn't match, or the
    /// agent's bucket is already at `max_entries` and `key` is new
    /// (spec.md §4.13).
    pub fn write(&self, agent_id: &str, key: &str, value: Value) -> bool {
        let Some(field) = self.schema.field(key) else { return false };
        if !field.field_type.matches(&value) {
            return false;
        }
        let mut data = self.data.lock().expect("memory data lock poisoned");
        let bucket = data.entry(agent_id.to_string()).or_default();
        if !bucket.contains_key(key) && bucket.len() >= self.schema.max_entries {
            return false;
        }
        let retention = field.retention.as_deref().unwrap_or(&self.schema.default_retention);
        let Ok(ttl_secs) = parse_duration(retention).map(|d| d.as_secs()) else { return false };
        let now = self.clock.now();
        bucket.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: now + chrono::Duration::seconds(ttl_secs as i64),
                tag: field.tag.clone(),
                encrypted: field.encrypted,
            },
        );
        true
    }

    /// Reads `key` for `agent_id`. Returns `None` for missing or expired
    /// entries, purging expired ones as a side effect. For `encrypted`
    /// fields, returns a fresh opaque handle id instead of the plaintext.
    pub fn read(&self, agent_id: &str, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut data = self.data.lock().expect("memory data lock poisoned");
        let bucket = data.get_mut(agent_id)?;
        let entry = bucket.get(key)?;
        if entry.expires_at <= now {
            bucket.remove(key);
            return None;
        }
        if entry.encrypted {
            let handle_id = format!("hdl_{}", Uuid::new_v4().simple());
            self.handles.lock().expect("memory handle lock poisoned").insert(
                handle_id.clone(),
                Handle {
                    owner_agent_id: agent_id.to_string(),
                    tag: entry.tag.clone(),
                    entry_expires_at: entry.expires_at,
                    key: key.to_string(),
                },
            );
            Some(Value::String(handle_id))
        } else {
            Some(entry.value.clone())
        }
    }

    /// Resolves a handle to its plaintext value. Only succeeds when
    /// `agent_id` matches the handle's owner, the underlying entry has not
    /// expired, and an action-boundary policy evaluation over the handle's
    /// tag allows it. Emits a memory-boundary audit event via `audit`.
    pub fn resolve_handle(
        &self,
        handle_id: &str,
        agent_id: &str,
        policy: &PolicyEngine,
        audit: &AuditLogger,
    ) -> Option<Value> {
        let now = self.clock.now();
        let handle = {
            let handles = self.handles.lock().expect("memory handle lock poisoned");
            handles.get(handle_id).cloned()
        }?;
        if handle.owner_agent_id != agent_id || handle.entry_expires_at <= now {
            return None;
        }
        // Gated by an action-boundary evaluation (spec.md §4.13); the audit
        // record itself is still filed under the memory boundary below.
        let ctx = PolicyContext::new(Boundary::Action, &[handle.tag.clone()], agent_id.to_string());
        let decision = policy.evaluate(&ctx);
        let event = AuditEventBuilder::new(Boundary::Memory, AuditAction::from(decision.action))
            .reason(decision.reason.clone())
            .agent_id(agent_id)
            .data_tags(vec![handle.tag.clone()])
            .build();
        let _ = audit.emit(event);
        if decision.is_non_allow() {
            return None;
        }
        let data = self.data.lock().expect("memory data lock poisoned");
        data.get(&handle.owner_agent_id)?.get(&handle.key).map(|e| e.value.clone())
    }

    /// Removes an agent's entry outright (no expiry check).
    pub fn purge(&self, agent_id: &str, key: &str) {
        if let Some(bucket) = self.data.lock().expect("memory data lock poisoned").get_mut(agent_id) {
            bucket.remove(key);
        }
        self.handles.lock().expect("memory handle lock poisoned").retain(|_, h| h.key != key || h.owner_agent_id != agent_id);
    }

    /// Removes every expired entry and its handles atomically, emitting a
    /// `memory-retention` audit event whenever anything was removed.
    pub fn purge_expired(&self, audit: &AuditLogger) -> usize {
        let now = self.clock.now();
        let mut data = self.data.lock().expect("memory data lock poisoned");
        let mut removed = 0usize;
        for bucket in data.values_mut() {
            let before = bucket.len();
            bucket.retain(|_, entry| entry.expires_at > now);
            removed += before - bucket.len();
        }
        self.handles.lock().expect("memory handle lock poisoned").retain(|_, h| h.entry_expires_at > now);
        if removed > 0 {
            let event = AuditEventBuilder::new(Boundary::Memory, AuditAction::Allow)
                .policy_name("memory-retention")
                .reason(format!("purged {removed} expired memory entries"))
                .agent_id("system")
                .build();
            let _ = audit.emit(event);
        }
        removed
    }
}
