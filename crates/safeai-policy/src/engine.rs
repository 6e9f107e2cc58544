//! Deterministic first-match policy engine with mtime-driven hot reload.
//!
//! Grounded on `original_source/safeai/core/policy.py`'s `PolicyEngine`
//! (RLock, `reload_if_changed`/`reload`/`register_reload`, `_matches`) and on
//! the locking discipline of ORCA's `policy::Engine` (short read lock for
//! evaluation, write lock only to swap the rule list).

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::UNIX_EPOCH;

use safeai_core::{tags_intersect_hierarchically, PolicyDecision, Result};

use crate::context::PolicyContext;
use crate::rule::PolicyRule;

type Loader = Box<dyn Fn(&[PathBuf]) -> Result<Vec<PolicyRule>> + Send + Sync>;

fn mtime_ns(path: &Path) -> i128 {
    std::fs::metadata(path)
        .and_then(std::fs::Metadata::modified)
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(-1, |d| d.as_nanos() as i128)
}

struct Watch {
    paths: Vec<PathBuf>,
    mtimes: Vec<i128>,
    loader: Option<Loader>,
}

impl Watch {
    fn empty() -> Self {
        Self { paths: Vec::new(), mtimes: Vec::new(), loader: None }
    }

    fn snapshot(&self) -> Vec<i128> {
        self.paths.iter().map(|p| mtime_ns(p)).collect()
    }
}

/// Sorts rules by priority (lower first); stable, so ties keep file order.
fn sort_rules(rules: &mut [PolicyRule]) {
    rules.sort_by_key(|r| r.priority);
}

/// Holds the live rule list and the watched-file snapshot used for
/// hot-reload. Evaluation takes a read lock; reload takes a write lock only
/// to swap the list, so no evaluation ever observes a partially replaced
/// rule set (spec.md §4.3, §5, §8 invariant 4).
pub struct Engine {
    rules: RwLock<Vec<PolicyRule>>,
    watch: Mutex<Watch>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with no rules loaded; every evaluation default-denies until
    /// rules are installed via [`Self::from_rules`] or a registered loader.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: RwLock::new(Vec::new()), watch: Mutex::new(Watch::empty()) }
    }

    /// Builds an engine from an already-loaded, unsorted rule list.
    #[must_use]
    pub fn from_rules(mut rules: Vec<PolicyRule>) -> Self {
        sort_rules(&mut rules);
        Self { rules: RwLock::new(rules), watch: Mutex::new(Watch::empty()) }
    }

    /// Registers the set of files this engine watches and the loader
    /// invoked to rebuild the rule list from them, then performs an initial
    /// unconditional load.
    pub fn register_reload(
        &self,
        paths: Vec<PathBuf>,
        loader: impl Fn(&[PathBuf]) -> Result<Vec<PolicyRule>> + Send + Sync + 'static,
    ) -> Result<()> {
        {
            let mut watch = self.watch.lock().expect("policy watch lock poisoned");
            watch.paths = paths;
            watch.loader = Some(Box::new(loader));
        }
        self.reload()
    }

    /// Unconditionally invokes the registered loader and replaces the rule
    /// list. If the loader errors, the prior rule list remains installed.
    pub fn reload(&self) -> Result<()> {
        let mut watch = self.watch.lock().expect("policy watch lock poisoned");
        let Some(loader) = watch.loader.as_ref() else {
            return Ok(());
        };
        let mut new_rules = loader(&watch.paths)?;
        sort_rules(&mut new_rules);
        *self.rules.write().expect("policy rules lock poisoned") = new_rules;
        watch.mtimes = watch.snapshot();
        Ok(())
    }

    /// Compares current file mtimes (missing file = `-1`) against the last
    /// snapshot; reloads only on a difference. Returns whether a reload
    /// happened.
    pub fn reload_if_changed(&self) -> Result<bool> {
        let changed = {
            let watch = self.watch.lock().expect("policy watch lock poisoned");
            watch.snapshot() != watch.mtimes
        };
        if changed {
            self.reload()?;
        }
        Ok(changed)
    }

    /// Evaluates `context` against the current rule list: first match wins,
    /// no match default-denies (spec.md §4.3).
    #[must_use]
    pub fn evaluate(&self, context: &PolicyContext) -> PolicyDecision {
        let rules = self.rules.read().expect("policy rules lock poisoned");
        for rule in rules.iter() {
            if Self::matches(rule, context) {
                return PolicyDecision {
                    action: rule.action,
                    policy_name: Some(rule.name.clone()),
                    reason: rule.reason.clone(),
                    fallback_template: rule.fallback_template.clone(),
                };
            }
        }
        PolicyDecision::default_deny()
    }

    fn matches(rule: &PolicyRule, context: &PolicyContext) -> bool {
        if !rule.boundary.contains(&context.boundary) {
            return false;
        }
        if let Some(tags) = &rule.condition.data_tags {
            if !tags_intersect_hierarchically(tags.clone(), context.data_tags.clone()) {
                return false;
            }
        }
        if let Some(tools) = &rule.condition.tools {
            match &context.tool_name {
                Some(tool) if tools.iter().any(|t| t == tool) => {}
                _ => return false,
            }
        }
        if let Some(agents) = &rule.condition.agents {
            if !agents.iter().any(|a| a == &context.agent_id) {
                return false;
            }
        }
        true
    }
}
