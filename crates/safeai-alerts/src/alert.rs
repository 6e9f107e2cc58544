//! `Alert` — one firing of an [`crate::AlertRule`] (spec.md §4.14).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One alert firing, ready for channel dispatch or persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique id for this firing.
    pub alert_id: String,
    /// Rule that fired.
    pub rule_id: String,
    /// Rule name, denormalized for display.
    pub rule_name: String,
    /// The rule's configured threshold.
    pub threshold: u64,
    /// The rule's configured window, as a compact duration string.
    pub window: String,
    /// Number of matching events observed in the window at fire time.
    pub count: usize,
    /// Channel names this alert was dispatched to.
    pub channels: Vec<String>,
    /// Distinct `metadata.tenant_id` values among the matched events, if any
    /// carried one.
    pub tenant_ids: Vec<String>,
    /// Up to 20 sample event ids from the matching set.
    pub sample_event_ids: Vec<String>,
    /// When this alert fired.
    pub timestamp: DateTime<Utc>,
}
