//! Deterministic, fail-closed policy engine (spec component C3).
//!
//! Evaluates a [`PolicyContext`] against a sorted [`PolicyRule`] list:
//! first match wins, no match default-denies. The rule list hot-reloads
//! under file mutation via an mtime snapshot comparison, never under a
//! partial-replacement window (spec.md §4.3, §5).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod engine;
mod loader;
mod rule;

pub use context::PolicyContext;
pub use engine::Engine;
pub use loader::{load_path, load_paths};
pub use rule::{normalize_rule, Condition, PolicyDocument, PolicyRule};
