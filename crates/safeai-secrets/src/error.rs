//! Secret resolution errors, propagated as typed errors to SDK callers
//! (spec.md §7: "Secret missing/denied ... raised as typed error").

use thiserror::Error;

/// Failure modes of [`crate::SecretManager::resolve_secret`].
#[derive(Debug, Error)]
pub enum SecretError {
    /// The capability token, scope, or key binding did not authorize this
    /// resolution.
    #[error("secret access denied: {0}")]
    SecretAccessDenied(String),

    /// The backend has no value for this key.
    #[error("secret not found: {0}")]
    SecretNotFound(String),

    /// No backend is registered under the requested name.
    #[error("unknown secret backend: {0}")]
    BackendNotFound(String),
}
