//! `ApprovalRequest` (spec.md §3). Grounded on
//! `original_source/safeai/core/approval.py`'s `ApprovalRequest`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an [`ApprovalRequest`]. Transitions only
/// `pending -> {approved, denied, expired}` (spec.md §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a human decision.
    Pending,
    /// A human approved the action.
    Approved,
    /// A human denied the action.
    Denied,
    /// The request elapsed before a decision was made.
    Expired,
}

/// A durable, dedup-keyed request for a human decision gating a
/// `require_approval` policy outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// `"apr_"` + 12 lowercase hex.
    pub request_id: String,
    /// Current lifecycle state.
    pub status: ApprovalStatus,
    /// Why approval is required.
    pub reason: String,
    /// Policy that produced the `require_approval` decision, if any.
    #[serde(default)]
    pub policy_name: Option<String>,
    /// Agent whose action needs approval.
    pub agent_id: String,
    /// Tool being invoked.
    pub tool_name: String,
    /// Session binding, when present.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Free-form action type discriminator.
    pub action_type: String,
    /// Tags associated with the gated action.
    #[serde(default)]
    pub data_tags: Vec<String>,
    /// When this request was created.
    pub requested_at: DateTime<Utc>,
    /// When this request elapses if undecided.
    pub expires_at: DateTime<Utc>,
    /// When a decision was recorded.
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    /// Who decided it.
    #[serde(default)]
    pub approver_id: Option<String>,
    /// Free-form note attached to the decision.
    #[serde(default)]
    pub decision_note: Option<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Dedupe key; a second `create_request` with the same unexpired
    /// pending key returns this row instead of creating a new one.
    #[serde(default)]
    pub dedupe_key: Option<String>,
}

impl ApprovalRequest {
    /// True iff this request is still `pending` but its `expires_at` has
    /// elapsed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ApprovalStatus::Pending && now >= self.expires_at
    }
}
