//! Sliding-window threshold alerting over the audit stream (spec component
//! C15, spec.md §4.14).
//!
//! An [`AlertEvaluator`] holds one window buffer per registered
//! [`AlertRule`]; feeding it audit events via `observe` returns any
//! [`Alert`]s that newly cross threshold outside their cooldown, ready for
//! [`dispatch_alert`] to hand to the rule's configured [`AlertChannel`]s.
//!
//! Grounded on `original_source/safeai/dashboard/service.py`
//! (`AlertRuleManager`) and `original_source/safeai/alerting/channels.py`
//! (channel implementations).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alert;
mod channel;
mod evaluator;
mod rule;

pub use alert::Alert;
pub use channel::{dispatch_alert, AlertChannel, FileChannel, SlackChannel, WebhookChannel};
pub use evaluator::AlertEvaluator;
pub use rule::{AlertFilters, AlertRule, AlertRuleDocument};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn file_channel_appends_one_line_per_alert() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("alerts.jsonl");
        let channel = FileChannel::new(&path);
        let alert = Alert {
            alert_id: "alr_1".into(),
            rule_id: "r1".into(),
            rule_name: "n".into(),
            threshold: 3,
            window: "1s".into(),
            count: 3,
            channels: vec!["file".into()],
            tenant_ids: vec![],
            sample_event_ids: vec![],
            timestamp: chrono::Utc::now(),
        };
        assert!(channel.send(&alert));
        assert!(channel.send(&alert));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn dispatch_isolates_unknown_channel_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");
        let mut channels: HashMap<String, Box<dyn AlertChannel>> = HashMap::new();
        channels.insert("file".into(), Box::new(FileChannel::new(&path)));
        let alert = Alert {
            alert_id: "alr_1".into(),
            rule_id: "r1".into(),
            rule_name: "n".into(),
            threshold: 1,
            window: "1s".into(),
            count: 1,
            channels: vec!["file".into(), "missing".into()],
            tenant_ids: vec![],
            sample_event_ids: vec![],
            timestamp: chrono::Utc::now(),
        };
        let results = dispatch_alert(&alert, &channels, &alert.channels.clone());
        assert_eq!(results.get("file"), Some(&true));
        assert_eq!(results.get("missing"), Some(&false));
    }

    #[test]
    fn rule_filters_default_to_match_anything() {
        let filters = AlertFilters::default();
        let event = safeai_audit::AuditEventBuilder::new(
            safeai_core::Boundary::Output,
            safeai_core::AuditAction::Allow,
        )
        .reason("ok")
        .agent_id("a")
        .build();
        assert!(filters.matches(&event));
    }

    #[test]
    fn rule_document_round_trips_through_yaml() {
        let doc = AlertRuleDocument {
            version: Some("v1alpha1".into()),
            alert_rules: vec![AlertRule {
                rule_id: "r1".into(),
                name: "blocked bursts".into(),
                threshold: 5,
                window: "5m".into(),
                cooldown: "15m".into(),
                filters: AlertFilters::default(),
                channels: vec!["slack".into()],
            }],
        };
        let yaml = serde_yaml_roundtrip(&doc);
        assert_eq!(yaml.alert_rules.len(), 1);
        assert_eq!(yaml.alert_rules[0].rule_id, "r1");
    }

    fn serde_yaml_roundtrip(doc: &AlertRuleDocument) -> AlertRuleDocument {
        let text = serde_json::to_string(doc).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}
