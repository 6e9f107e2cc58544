//! In-process `AuditEvent` query: read the file, parse-or-skip each line,
//! filter in code (spec.md §4.4).

use std::io::BufRead as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use safeai_core::{expand_tags, parse_duration, AuditAction, Boundary, Result};

use crate::event::AuditEvent;
use crate::logger::AuditLogger;

/// Filter combination for [`AuditLogger::query`] (via [`query`]). Every
/// field is optional; a `None` field matches anything. Deserializable so
/// `/v1/audit/query` can take one straight off the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Restrict to this boundary.
    #[serde(default)]
    pub boundary: Option<Boundary>,
    /// Restrict to this action.
    #[serde(default)]
    pub action: Option<AuditAction>,
    /// Restrict to this policy name (use `Some(None)` via `policy_name_is_none`
    /// if you need "no policy name"; left simple here per spec's filter list).
    #[serde(default)]
    pub policy_name: Option<String>,
    /// Restrict to this agent id.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Restrict to this tool name.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Restrict to events whose expanded tag set contains this tag's
    /// hierarchy (ancestor-matches, per §4.2).
    #[serde(default)]
    pub data_tag: Option<String>,
    /// Restrict to events whose `metadata.phase` equals this value.
    #[serde(default)]
    pub phase: Option<String>,
    /// Restrict to this session id.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Restrict to this exact event id.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Restrict to this source agent id.
    #[serde(default)]
    pub source_agent_id: Option<String>,
    /// Restrict to this destination agent id.
    #[serde(default)]
    pub destination_agent_id: Option<String>,
    /// Restrict to events whose `metadata[key] == value`.
    #[serde(default)]
    pub metadata_key_value: Option<(String, Value)>,
    /// Restrict to events at or after this timestamp.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Restrict to events at or before this timestamp.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    /// Restrict to events within `last` of now, as a compact duration
    /// (`"30s"`, `"15m"`, `"2h"`, `"7d"`, `"2w"`).
    #[serde(default)]
    pub last: Option<String>,
    /// Cap the number of returned events.
    #[serde(default)]
    pub limit: Option<usize>,
}

fn matches(event: &AuditEvent, filter: &AuditFilter) -> bool {
    if let Some(b) = filter.boundary {
        if event.boundary != b {
            return false;
        }
    }
    if let Some(a) = filter.action {
        if event.action != a {
            return false;
        }
    }
    if let Some(name) = &filter.policy_name {
        if event.policy_name.as_deref() != Some(name.as_str()) {
            return false;
        }
    }
    if let Some(agent) = &filter.agent_id {
        if &event.agent_id != agent {
            return false;
        }
    }
    if let Some(tool) = &filter.tool_name {
        if event.tool_name.as_deref() != Some(tool.as_str()) {
            return false;
        }
    }
    if let Some(tag) = &filter.data_tag {
        let expanded = expand_tags(&event.data_tags);
        if !expand_tags([tag.clone()]).iter().any(|t| expanded.contains(t)) {
            return false;
        }
    }
    if let Some(phase) = &filter.phase {
        if event.metadata.get("phase").and_then(Value::as_str) != Some(phase.as_str()) {
            return false;
        }
    }
    if let Some(session) = &filter.session_id {
        if event.session_id.as_deref() != Some(session.as_str()) {
            return false;
        }
    }
    if let Some(id) = &filter.event_id {
        if &event.event_id != id {
            return false;
        }
    }
    if let Some(src) = &filter.source_agent_id {
        if event.source_agent_id.as_deref() != Some(src.as_str()) {
            return false;
        }
    }
    if let Some(dst) = &filter.destination_agent_id {
        if event.destination_agent_id.as_deref() != Some(dst.as_str()) {
            return false;
        }
    }
    if let Some((key, value)) = &filter.metadata_key_value {
        if event.metadata.get(key) != Some(value) {
            return false;
        }
    }
    let Ok(ts) = DateTime::parse_from_rfc3339(&event.timestamp).map(|t| t.with_timezone(&Utc))
    else {
        return false;
    };
    if let Some(since) = filter.since {
        if ts < since {
            return false;
        }
    }
    if let Some(until) = filter.until {
        if ts > until {
            return false;
        }
    }
    if let Some(last) = &filter.last {
        let Ok(secs) = parse_duration(last).map(|d| d.as_secs()) else {
            return false;
        };
        if Utc::now().signed_duration_since(ts).num_seconds() > secs as i64 {
            return false;
        }
    }
    true
}

/// Reads every line of the logger's backing file, skipping parse failures,
/// filters in-process, and returns events newest-first, bounded by
/// `filter.limit`. A missing file returns an empty result.
pub fn query(logger: &AuditLogger, filter: &AuditFilter) -> Result<Vec<AuditEvent>> {
    let file = match std::fs::File::open(logger.path()) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let reader = std::io::BufReader::new(file);
    let mut events: Vec<AuditEvent> = Vec::new();
    for line in reader.lines() {
        let Ok(line) = line else { continue };
        if line.trim().is_empty() {
            continue;
        }
        let Ok(event) = serde_json::from_str::<AuditEvent>(&line) else {
            continue;
        };
        if matches(&event, filter) {
            events.push(event);
        }
    }
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if let Some(limit) = filter.limit {
        events.truncate(limit);
    }
    Ok(events)
}
