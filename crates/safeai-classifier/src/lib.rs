//! Regex-driven pattern classifier mapping free text to hierarchical data
//! tags (spec component C1), plus the built-in detector catalogue.
//!
//! Grounded on `original_source/safeai/core/classifier.py` and
//! `original_source/safeai/detectors/*.py`. The compiling style follows
//! `policy::Engine`, which builds its PII `Regex` once at construction and
//! stores it on the struct rather than recompiling per call.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod detectors;

pub use detectors::{all_detectors, DetectorDef};

use regex::RegexBuilder;
use safeai_core::{Detection, Result, SafeAiError};

#[derive(Clone)]
struct CompiledDetector {
    name: String,
    tag: String,
    pattern: regex::Regex,
}

/// Compiles a set of `(name, tag, pattern)` triples and classifies text
/// against all of them.
///
/// Detections from overlapping detectors are never deduplicated: every
/// detector that matches a span emits its own [`Detection`], and policy
/// evaluation is responsible for unioning the resulting tags.
#[derive(Clone)]
pub struct Classifier {
    detectors: Vec<CompiledDetector>,
}

impl Classifier {
    /// Builds a classifier from the built-in detector catalogue plus any
    /// caller-supplied additional `(name, tag, pattern)` triples.
    ///
    /// An invalid regex is a fatal configuration error and is returned as
    /// an `Err`, never caught silently or turned into a panic.
    pub fn new(extra: &[DetectorDef]) -> Result<Self> {
        let mut defs = all_detectors();
        defs.extend_from_slice(extra);
        Self::from_defs(&defs)
    }

    /// Builds a classifier from exactly the given detector definitions,
    /// bypassing the built-in catalogue. Useful for tests and for callers
    /// that want to fully replace the default detectors.
    pub fn from_defs(defs: &[DetectorDef]) -> Result<Self> {
        let mut detectors = Vec::with_capacity(defs.len());
        for (name, tag, pattern) in defs {
            let compiled = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    SafeAiError::Config(format!("detector '{name}' has invalid pattern: {e}"))
                })?;
            detectors.push(CompiledDetector {
                name: (*name).to_string(),
                tag: (*tag).to_string(),
                pattern: compiled,
            });
        }
        Ok(Self { detectors })
    }

    /// Runs every compiled detector over `text` and returns all detections
    /// sorted by `(start, end)`. Detections from different detectors that
    /// cover the same or overlapping spans are all retained.
    #[must_use]
    pub fn classify(&self, text: &str) -> Vec<Detection> {
        let mut out = Vec::new();
        for detector in &self.detectors {
            for m in detector.pattern.find_iter(text) {
                if let Ok(detection) = Detection::new(
                    detector.name.clone(),
                    detector.tag.clone(),
                    m.start(),
                    m.end(),
                    m.as_str().to_string(),
                ) {
                    out.push(detection);
                }
            }
        }
        out.sort_by_key(Detection::sort_key);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogue_compiles() {
        let classifier = Classifier::new(&[]).expect("builtin patterns must compile");
        let hits = classifier.classify("contact me at a@b.com or call 555-123-4567");
        assert!(hits.iter().any(|d| d.detector == "email"));
        assert!(hits.iter().any(|d| d.detector == "phone"));
    }

    #[test]
    fn overlapping_detections_are_not_deduplicated() {
        let defs: Vec<DetectorDef> = vec![
            ("a", "x.y", r"sk-[A-Za-z0-9]{20,}"),
            ("b", "x.z", r"sk-[A-Za-z0-9]{20,}"),
        ];
        let classifier = Classifier::from_defs(&defs).unwrap();
        let hits = classifier.classify("token is sk-abcdefghijklmnopqrstuvwxyz");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn invalid_pattern_is_an_error_not_a_panic() {
        let defs: Vec<DetectorDef> = vec![("bad", "x.y", r"(unclosed")];
        let result = Classifier::from_defs(&defs);
        assert!(result.is_err());
    }

    #[test]
    fn results_are_sorted_by_span() {
        let classifier = Classifier::new(&[]).unwrap();
        let hits = classifier.classify("ssn 123-45-6789 then email a@b.com");
        let spans: Vec<_> = hits.iter().map(Detection::sort_key).collect();
        let mut sorted = spans.clone();
        sorted.sort_unstable();
        assert_eq!(spans, sorted);
    }
}
