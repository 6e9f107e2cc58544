//! `Detection` — the unit the classifier (C1) produces (spec.md §3).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SafeAiError};
use crate::tag::normalize_tag;

/// A single classifier hit: `{detector, tag, start, end, value}`.
///
/// No ownership over source text; `value` is the matched substring, derived
/// on demand at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Name of the detector that produced this hit (e.g. `"email"`).
    pub detector: String,
    /// Normalized, lowercase hierarchical tag (e.g. `"personal.pii"`).
    pub tag: String,
    /// Byte offset of the match start within the scanned text.
    pub start: usize,
    /// Byte offset of the match end (exclusive); always `>= start`.
    pub end: usize,
    /// The matched substring.
    pub value: String,
}

impl Detection {
    /// Construct a validated detection. Fails if `tag` is not a valid dotted
    /// tag or if `end < start`.
    pub fn new(
        detector: impl Into<String>,
        tag: impl Into<String>,
        start: usize,
        end: usize,
        value: impl Into<String>,
    ) -> Result<Self> {
        let detector = detector.into();
        if detector.trim().is_empty() {
            return Err(SafeAiError::Validation("detector name must be non-empty".into()));
        }
        let tag = normalize_tag(&tag.into())
            .ok_or_else(|| SafeAiError::Validation("invalid tag format".into()))?;
        if end < start {
            return Err(SafeAiError::Validation("end must be >= start".into()));
        }
        Ok(Self { detector, tag, start, end, value: value.into() })
    }

    /// Sort key used to keep classifier output deterministic: `(start, end)`.
    #[must_use]
    pub fn sort_key(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_span() {
        assert!(Detection::new("email", "personal.pii", 5, 2, "x").is_err());
    }

    #[test]
    fn rejects_bad_tag() {
        assert!(Detection::new("email", "1bad", 0, 1, "x").is_err());
    }

    #[test]
    fn normalizes_tag_case() {
        let d = Detection::new("email", "Personal.PII", 0, 1, "x").unwrap();
        assert_eq!(d.tag, "personal.pii");
    }
}
