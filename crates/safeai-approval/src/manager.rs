//! `ApprovalManager` — file-backed, dedupe-keyed approval workflow
//! (spec.md §4.8).
//!
//! Grounded on `original_source/safeai/core/approval.py`'s
//! `ApprovalManager` (JSONL persistence sorted by `requested_at`,
//! mtime-based cross-process reload, lazy expiry reclassification).

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use safeai_core::{new_approval_request_id, parse_duration, system_clock, Result, SharedClock};

use crate::model::{ApprovalRequest, ApprovalStatus};

/// Outcome of [`ApprovalManager::validate`].
#[derive(Debug, Clone)]
pub struct ApprovalValidationResult {
    /// Whether the request is approved and bound to the supplied context.
    pub allowed: bool,
    /// Human-readable reason.
    pub reason: String,
}

fn mtime_ns(path: &std::path::Path) -> i128 {
    std::fs::metadata(path)
        .and_then(std::fs::Metadata::modified)
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(-1, |d| d.as_nanos() as i128)
}

struct State {
    requests: Vec<ApprovalRequest>,
    last_mtime: i128,
}

/// Durable approval request store backed by one JSONL file per instance.
pub struct ApprovalManager {
    path: PathBuf,
    default_ttl: String,
    clock: SharedClock,
    state: Mutex<State>,
}

impl ApprovalManager {
    /// Opens (or creates) the approval store at `path`, using the system
    /// clock and a `"30m"` default TTL.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_clock(path, "30m", system_clock())
    }

    /// Opens the store with an injected default TTL and clock.
    pub fn with_clock(path: impl Into<PathBuf>, default_ttl: &str, clock: SharedClock) -> Result<Self> {
        let path = path.into();
        let requests = if path.exists() { Self::load_file(&path)? } else { Vec::new() };
        let manager = Self {
            path,
            default_ttl: default_ttl.to_string(),
            clock,
            state: Mutex::new(State { requests, last_mtime: -1 }),
        };
        manager.state.lock().expect("approval state lock poisoned").last_mtime = mtime_ns(&manager.path);
        Ok(manager)
    }

    fn load_file(path: &std::path::Path) -> Result<Vec<ApprovalRequest>> {
        let text = std::fs::read_to_string(path)?;
        let mut out = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(req) = serde_json::from_str::<ApprovalRequest>(line) {
                out.push(req);
            }
        }
        Ok(out)
    }

    fn persist_locked(&self, state: &mut State) -> Result<()> {
        state.requests.sort_by_key(|r| r.requested_at);
        let mut buf = String::new();
        for req in &state.requests {
            buf.push_str(&serde_json::to_string(req)?);
            buf.push('\n');
        }
        std::fs::write(&self.path, buf)?;
        state.last_mtime = mtime_ns(&self.path);
        Ok(())
    }

    fn reload_if_changed_locked(&self, state: &mut State) -> Result<()> {
        let current = mtime_ns(&self.path);
        if current != state.last_mtime {
            state.requests = if self.path.exists() { Self::load_file(&self.path)? } else { Vec::new() };
            state.last_mtime = current;
        }
        Ok(())
    }

    /// Reclassifies any pending-but-elapsed row to `expired` in place.
    /// Returns whether anything changed.
    fn reclass_expired_locked(&self, state: &mut State) -> bool {
        let now = self.clock.now();
        let mut changed = false;
        for req in &mut state.requests {
            if req.is_expired(now) {
                req.status = ApprovalStatus::Expired;
                changed = true;
            }
        }
        changed
    }

    /// Creates a new request, or returns the existing unexpired pending row
    /// with the same `dedupe_key` if one exists (spec.md §4.8 "at-most-one
    /// concurrent pending approval per logical request").
    #[allow(clippy::too_many_arguments)]
    pub fn create_request(
        &self,
        reason: impl Into<String>,
        policy_name: Option<String>,
        agent_id: impl Into<String>,
        tool_name: impl Into<String>,
        session_id: Option<String>,
        action_type: impl Into<String>,
        data_tags: Vec<String>,
        metadata: serde_json::Value,
        dedupe_key: Option<String>,
        ttl: Option<&str>,
    ) -> Result<ApprovalRequest> {
        let mut state = self.state.lock().expect("approval state lock poisoned");
        self.reload_if_changed_locked(&mut state)?;
        self.reclass_expired_locked(&mut state);

        let now = self.clock.now();
        if let Some(key) = &dedupe_key {
            if let Some(existing) = state.requests.iter().find(|r| {
                r.dedupe_key.as_deref() == Some(key.as_str()) && r.status == ApprovalStatus::Pending
            }) {
                return Ok(existing.clone());
            }
        }

        let ttl_secs = parse_duration(ttl.unwrap_or(&self.default_ttl))?.as_secs();
        let request = ApprovalRequest {
            request_id: new_approval_request_id(),
            status: ApprovalStatus::Pending,
            reason: reason.into(),
            policy_name,
            agent_id: agent_id.into(),
            tool_name: tool_name.into(),
            session_id,
            action_type: action_type.into(),
            data_tags,
            requested_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_secs as i64),
            decided_at: None,
            approver_id: None,
            decision_note: None,
            metadata,
            dedupe_key,
        };
        state.requests.push(request.clone());
        self.persist_locked(&mut state)?;
        Ok(request)
    }

    /// Fetches a request by id, lazily reclassifying it to `expired` and
    /// persisting if it has elapsed.
    pub fn get(&self, request_id: &str) -> Result<Option<ApprovalRequest>> {
        let mut state = self.state.lock().expect("approval state lock poisoned");
        self.reload_if_changed_locked(&mut state)?;
        let changed = self.reclass_expired_locked(&mut state);
        if changed {
            self.persist_locked(&mut state)?;
        }
        Ok(state.requests.iter().find(|r| r.request_id == request_id).cloned())
    }

    /// Lists every known request (after reload and lazy reclassification).
    pub fn list_requests(&self) -> Result<Vec<ApprovalRequest>> {
        let mut state = self.state.lock().expect("approval state lock poisoned");
        self.reload_if_changed_locked(&mut state)?;
        let changed = self.reclass_expired_locked(&mut state);
        if changed {
            self.persist_locked(&mut state)?;
        }
        Ok(state.requests.clone())
    }

    fn decide(
        &self,
        request_id: &str,
        status: ApprovalStatus,
        approver_id: impl Into<String>,
        decision_note: Option<String>,
    ) -> Result<bool> {
        let mut state = self.state.lock().expect("approval state lock poisoned");
        self.reload_if_changed_locked(&mut state)?;
        self.reclass_expired_locked(&mut state);
        let now = self.clock.now();
        let Some(req) = state.requests.iter_mut().find(|r| r.request_id == request_id) else {
            return Ok(false);
        };
        if req.status != ApprovalStatus::Pending {
            return Ok(false);
        }
        req.status = status;
        req.approver_id = Some(approver_id.into());
        req.decision_note = decision_note;
        req.decided_at = Some(now);
        self.persist_locked(&mut state)?;
        Ok(true)
    }

    /// Approves a pending, unexpired request. Returns `false` otherwise.
    pub fn approve(
        &self,
        request_id: &str,
        approver_id: impl Into<String>,
        note: Option<String>,
    ) -> Result<bool> {
        self.decide(request_id, ApprovalStatus::Approved, approver_id, note)
    }

    /// Denies a pending, unexpired request. Returns `false` otherwise.
    pub fn deny(
        &self,
        request_id: &str,
        approver_id: impl Into<String>,
        note: Option<String>,
    ) -> Result<bool> {
        self.decide(request_id, ApprovalStatus::Denied, approver_id, note)
    }

    /// Validates that `request_id` is approved and bound to the supplied
    /// `(agent_id, tool_name, session_id)` (spec.md §4.8).
    pub fn validate(
        &self,
        request_id: &str,
        agent_id: &str,
        tool_name: &str,
        session_id: Option<&str>,
    ) -> Result<ApprovalValidationResult> {
        let Some(req) = self.get(request_id)? else {
            return Ok(ApprovalValidationResult {
                allowed: false,
                reason: format!("approval request '{request_id}' does not exist"),
            });
        };
        match req.status {
            ApprovalStatus::Pending => {
                return Ok(ApprovalValidationResult {
                    allowed: false,
                    reason: "approval request is still pending".to_string(),
                })
            }
            ApprovalStatus::Denied => {
                return Ok(ApprovalValidationResult {
                    allowed: false,
                    reason: "approval request was denied".to_string(),
                })
            }
            ApprovalStatus::Expired => {
                return Ok(ApprovalValidationResult {
                    allowed: false,
                    reason: "approval request expired".to_string(),
                })
            }
            ApprovalStatus::Approved => {}
        }
        if req.agent_id != agent_id || req.tool_name != tool_name {
            return Ok(ApprovalValidationResult {
                allowed: false,
                reason: "approval request is not bound to this agent/tool".to_string(),
            });
        }
        if let Some(bound_session) = &req.session_id {
            if session_id != Some(bound_session.as_str()) {
                return Ok(ApprovalValidationResult {
                    allowed: false,
                    reason: "approval request session binding does not match".to_string(),
                });
            }
        }
        Ok(ApprovalValidationResult { allowed: true, reason: String::new() })
    }

    /// Removes every request no longer `pending` whose `expires_at` plus
    /// the default TTL has elapsed twice over, keeping the file from
    /// growing unbounded. Returns the number of rows dropped.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut state = self.state.lock().expect("approval state lock poisoned");
        self.reload_if_changed_locked(&mut state)?;
        self.reclass_expired_locked(&mut state);
        let now = self.clock.now();
        let before = state.requests.len();
        state.requests.retain(|r| {
            r.status == ApprovalStatus::Pending || now - r.expires_at < chrono::Duration::days(1)
        });
        let removed = before - state.requests.len();
        if removed > 0 {
            self.persist_locked(&mut state)?;
        }
        Ok(removed)
    }
}
