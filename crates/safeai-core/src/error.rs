//! Shared leaf error type.
//!
//! Boundary APIs never unwind on caller input (see `spec.md` §7): this type
//! is used for construction/config-loading failures, never for decision
//! outcomes (those are always `PolicyDecision`-shaped values).

use thiserror::Error;

/// Errors shared across the SafeAI workspace crates.
#[derive(Debug, Error)]
pub enum SafeAiError {
    /// A value failed schema/shape validation (malformed tag, empty name, …).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A duration string did not match the `^\d+[smhdw]$` grammar.
    #[error("invalid duration '{0}': use forms like 30s, 15m, 2h, 7d, 2w")]
    InvalidDuration(String),

    /// Configuration document failed to parse or validate.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Underlying I/O failure (reading policy/contract/identity files, …).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serde_json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SafeAiError>;
