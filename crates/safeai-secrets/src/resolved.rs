//! `ResolvedSecret` — a value that never prints itself.
//!
//! Grounded on `original_source/safeai/secrets/manager.py`'s
//! `ResolvedSecret` (frozen dataclass, custom `__repr__` masking the value
//! as `'***'`; spec.md §8 invariant 5: secrets never appear verbatim in
//! any audit event, exception message, or repr).

/// A secret value resolved through a backend. `Debug` and `Display` both
/// mask the value; only [`ResolvedSecret::expose`] returns the plaintext,
/// and callers should use it only at the point of use.
pub struct ResolvedSecret {
    key: String,
    value: String,
}

impl ResolvedSecret {
    /// Wraps a resolved plaintext value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// The secret key this value was resolved for.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The plaintext value. Named distinctly from any `Display`/`Debug`
    /// impl so that masking can never be bypassed by accident.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecret").field("key", &self.key).field("value", &"***").finish()
    }
}

impl std::fmt::Display for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResolvedSecret({}=***)", self.key)
    }
}
