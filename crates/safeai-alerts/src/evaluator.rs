//! `AlertEvaluator` — sliding-window threshold trigger with cooldown dedup
//! (spec component C15, spec.md §4.14, §5 "Alert evaluator windows").
//!
//! Grounded on `original_source/safeai/dashboard/service.py`'s
//! `AlertRuleManager.evaluate` (sliding cutoff, `_matches_rule`, alert
//! payload shape), adapted from its batch-evaluate-over-a-list shape to an
//! incremental per-event `observe` the way a live audit callback needs.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use safeai_audit::AuditEvent;
use safeai_core::{parse_duration, system_clock, Result, SharedClock};

use crate::alert::Alert;
use crate::rule::AlertRule;

struct Observation {
    at: DateTime<Utc>,
    event_id: String,
    tenant_id: Option<String>,
}

struct RuleState {
    rule: AlertRule,
    window_secs: i64,
    cooldown_secs: i64,
    buffer: Vec<Observation>,
    last_fired_at: Option<DateTime<Utc>>,
}

fn tenant_of(event: &AuditEvent) -> Option<String> {
    event.metadata.get("tenant_id").and_then(|v| v.as_str()).map(str::to_string)
}

/// Maintains one sliding-window buffer per registered rule and fires an
/// [`Alert`] whenever the buffer reaches threshold outside the cooldown.
pub struct AlertEvaluator {
    clock: SharedClock,
    rules: Mutex<HashMap<String, RuleState>>,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertEvaluator {
    /// An evaluator with no rules registered, using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// An evaluator using an injected clock (tests).
    #[must_use]
    pub fn with_clock(clock: SharedClock) -> Self {
        Self { clock, rules: Mutex::new(HashMap::new()) }
    }

    /// Registers (or replaces) a rule, resetting its window buffer.
    pub fn register_rule(&self, rule: AlertRule) -> Result<()> {
        let window_secs = parse_duration(&rule.window)?.as_secs() as i64;
        let cooldown_secs = parse_duration(&rule.cooldown)?.as_secs() as i64;
        let mut rules = self.rules.lock().expect("alert evaluator lock poisoned");
        rules.insert(
            rule.rule_id.clone(),
            RuleState { rule, window_secs, cooldown_secs, buffer: Vec::new(), last_fired_at: None },
        );
        Ok(())
    }

    /// Drops every registered rule and its window state.
    pub fn clear_rules(&self) {
        self.rules.lock().expect("alert evaluator lock poisoned").clear();
    }

    /// Feeds one audit event to every registered rule, evicting stale
    /// window entries and firing any rule that newly crosses threshold
    /// outside its cooldown. Adding the event and checking the threshold
    /// happen atomically under one lock; the caller dispatches the
    /// returned alerts to channels outside that lock (spec.md §5).
    #[must_use]
    pub fn observe(&self, event: &AuditEvent) -> Vec<Alert> {
        let now = self.clock.now();
        let mut fired = Vec::new();
        let mut rules = self.rules.lock().expect("alert evaluator lock poisoned");
        for state in rules.values_mut() {
            let cutoff = now - chrono::Duration::seconds(state.window_secs);
            state.buffer.retain(|obs| obs.at > cutoff);
            if state.rule.filters.matches(event) {
                state.buffer.push(Observation {
                    at: now,
                    event_id: event.event_id.clone(),
                    tenant_id: tenant_of(event),
                });
            }
            let count = state.buffer.len();
            if count < state.rule.threshold as usize {
                continue;
            }
            let cooled_down = state
                .last_fired_at
                .map_or(true, |last| (now - last).num_seconds() > state.cooldown_secs);
            if !cooled_down {
                continue;
            }
            state.last_fired_at = Some(now);
            let mut tenant_ids: Vec<String> =
                state.buffer.iter().filter_map(|o| o.tenant_id.clone()).collect();
            tenant_ids.sort();
            tenant_ids.dedup();
            let sample_event_ids =
                state.buffer.iter().rev().take(20).map(|o| o.event_id.clone()).collect();
            fired.push(Alert {
                alert_id: format!("alr_{}_{}", now.format("%Y%m%d%H%M%S%3f"), state.rule.rule_id),
                rule_id: state.rule.rule_id.clone(),
                rule_name: state.rule.name.clone(),
                threshold: state.rule.threshold,
                window: state.rule.window.clone(),
                count,
                channels: state.rule.channels.clone(),
                tenant_ids,
                sample_event_ids,
                timestamp: now,
            });
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use safeai_audit::AuditEventBuilder;
    use safeai_core::{AuditAction, Boundary, Clock};

    use crate::rule::AlertFilters;

    use super::*;

    struct FixedClock(StdMutex<DateTime<Utc>>);
    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn block_event() -> AuditEvent {
        AuditEventBuilder::new(Boundary::Input, AuditAction::Block)
            .reason("blocked")
            .agent_id("a")
            .build()
    }

    #[test]
    fn fires_once_threshold_reached_within_window() {
        let clock = Arc::new(FixedClock(StdMutex::new(Utc::now())));
        let evaluator = AlertEvaluator::with_clock(clock.clone());
        evaluator
            .register_rule(AlertRule {
                rule_id: "r1".into(),
                name: "too many blocks".into(),
                threshold: 3,
                window: "1s".into(),
                cooldown: "0s".into(),
                filters: AlertFilters { actions: vec![AuditAction::Block], ..Default::default() },
                channels: vec![],
            })
            .unwrap();

        assert!(evaluator.observe(&block_event()).is_empty());
        assert!(evaluator.observe(&block_event()).is_empty());
        let fired = evaluator.observe(&block_event());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].count, 3);
    }

    #[test]
    fn window_resets_after_elapsing() {
        let clock = Arc::new(FixedClock(StdMutex::new(Utc::now())));
        let evaluator = AlertEvaluator::with_clock(clock.clone());
        evaluator
            .register_rule(AlertRule {
                rule_id: "r1".into(),
                name: "n".into(),
                threshold: 3,
                window: "1s".into(),
                cooldown: "0s".into(),
                filters: AlertFilters { actions: vec![AuditAction::Block], ..Default::default() },
                channels: vec![],
            })
            .unwrap();
        for _ in 0..3 {
            evaluator.observe(&block_event());
        }
        *clock.0.lock().unwrap() = Utc::now() + chrono::Duration::seconds(2);
        let fired = evaluator.observe(&block_event());
        assert!(fired.is_empty());
    }

    #[test]
    fn cooldown_dedupes_repeated_bursts() {
        let clock = Arc::new(FixedClock(StdMutex::new(Utc::now())));
        let evaluator = AlertEvaluator::with_clock(clock.clone());
        evaluator
            .register_rule(AlertRule {
                rule_id: "r1".into(),
                name: "n".into(),
                threshold: 3,
                window: "600s".into(),
                cooldown: "300s".into(),
                filters: AlertFilters { actions: vec![AuditAction::Block], ..Default::default() },
                channels: vec![],
            })
            .unwrap();
        let mut total_fired = 0;
        for _ in 0..3 {
            total_fired += evaluator.observe(&block_event()).len();
        }
        for _ in 0..3 {
            total_fired += evaluator.observe(&block_event()).len();
        }
        assert_eq!(total_fired, 1);
    }
}
