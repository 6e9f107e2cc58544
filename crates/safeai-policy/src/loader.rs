//! YAML/JSON policy document loading, used directly and as the default
//! loader callback passed to [`crate::Engine::register_reload`].

use std::path::{Path, PathBuf};

use safeai_core::{Result, SafeAiError};

use crate::rule::{normalize_rule, PolicyDocument, PolicyRule};

/// Loads and normalizes every rule across `paths`, in order, concatenating
/// the resulting rule lists. A schema or parse error is fatal: loader
/// errors are never caught silently (spec.md §4.3, §7 "fatal at start-up").
pub fn load_paths(paths: &[PathBuf]) -> Result<Vec<PolicyRule>> {
    let mut rules = Vec::new();
    for path in paths {
        rules.extend(load_path(path)?);
    }
    Ok(rules)
}

/// Loads a single policy document (YAML or JSON, by extension) from disk.
pub fn load_path(path: &Path) -> Result<Vec<PolicyRule>> {
    let text = std::fs::read_to_string(path)?;
    let doc: PolicyDocument = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&text).map_err(|e| SafeAiError::Config(e.to_string()))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| SafeAiError::Config(e.to_string()))?
    };
    doc.rules.into_iter().map(normalize_rule).collect()
}
