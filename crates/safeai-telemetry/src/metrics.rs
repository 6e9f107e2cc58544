//! In-process decision counters, exposed read-only for `/v1/metrics`
//! (spec.md §6). Grounded on the teacher's `telemetry::BudgetMetrics`
//! (`Arc<AtomicU64>` counters updated with `Relaxed` ordering, snapshot by
//! load) generalized from a single token/cost pair to one counter per
//! `(Boundary, AuditAction)` pair plus a classifier-detection total.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use safeai_core::{AuditAction, Boundary};

/// Cheaply cloneable counter set. Every counter is a `Relaxed` atomic; this
/// is visibility for dashboards, not a source of truth (the audit log is).
#[derive(Clone, Default)]
pub struct Metrics {
    decisions: Arc<RwLock<HashMap<(Boundary, AuditAction), Arc<AtomicU64>>>>,
    detections_total: Arc<AtomicU64>,
}

impl Metrics {
    /// A fresh, zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for one `(boundary, action)` pair.
    pub fn record_decision(&self, boundary: Boundary, action: AuditAction) {
        let key = (boundary, action);
        if let Some(counter) = self.decisions.read().expect("metrics lock poisoned").get(&key) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let mut decisions = self.decisions.write().expect("metrics lock poisoned");
        decisions.entry(key).or_insert_with(|| Arc::new(AtomicU64::new(0))).fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `count` classifier detections to the running total.
    pub fn record_detections(&self, count: u64) {
        if count > 0 {
            self.detections_total.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// A point-in-time snapshot: `(boundary, action) -> count`, plus the
    /// running classifier detection total.
    #[must_use]
    pub fn snapshot(&self) -> (HashMap<(Boundary, AuditAction), u64>, u64) {
        let decisions = self.decisions.read().expect("metrics lock poisoned");
        let counts = decisions.iter().map(|(k, v)| (*k, v.load(Ordering::Relaxed))).collect();
        (counts, self.detections_total.load(Ordering::Relaxed))
    }
}
