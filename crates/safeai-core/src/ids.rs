//! ID generation for the three prefixed identifiers the spec defines:
//! `evt_`, `cap_`, `apr_` followed by lowercase hex (spec.md §3).

use uuid::Uuid;

fn hex_chars(n: usize) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    // UUID v4 simple form is 32 lowercase hex chars; double up if more are
    // ever needed than a single UUID provides.
    let mut out = String::with_capacity(n);
    while out.len() < n {
        out.push_str(&simple);
    }
    out.truncate(n);
    out
}

/// `evt_` + 12 lowercase hex chars (`AuditEvent.event_id`).
#[must_use]
pub fn new_event_id() -> String {
    format!("evt_{}", hex_chars(12))
}

/// `cap_` + 24 lowercase hex chars (`CapabilityToken.token_id`).
#[must_use]
pub fn new_capability_token_id() -> String {
    format!("cap_{}", hex_chars(24))
}

/// `apr_` + 12 lowercase hex chars (`ApprovalRequest.request_id`).
#[must_use]
pub fn new_approval_request_id() -> String {
    format!("apr_{}", hex_chars(12))
}
