//! Shared span-redaction used by the input scanner, output guard, and
//! structured scanner (spec.md §4.10 "redact ⇒ replace each detection span
//! with `[REDACTED]` right-to-left to preserve earlier offsets").

use safeai_core::Detection;

const REDACTED: &str = "[REDACTED]";

/// Replaces every detection span in `text` with `[REDACTED]`, working
/// right-to-left so that earlier byte offsets stay valid as later ones are
/// rewritten.
#[must_use]
pub fn redact_spans(text: &str, detections: &[Detection]) -> String {
    let mut sorted: Vec<&Detection> = detections.iter().collect();
    sorted.sort_by_key(|d| d.sort_key());
    let mut out = text.to_string();
    for detection in sorted.iter().rev() {
        if detection.end > out.len() || detection.start > detection.end {
            continue;
        }
        out.replace_range(detection.start..detection.end, REDACTED);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_multiple_spans_preserving_offsets() {
        let text = "email a@b.com and b@c.com";
        let detections = vec![
            Detection::new("email", "personal.pii", 6, 13, "a@b.com").unwrap(),
            Detection::new("email", "personal.pii", 18, 25, "b@c.com").unwrap(),
        ];
        let out = redact_spans(text, &detections);
        assert_eq!(out, "email [REDACTED] and [REDACTED]");
    }
}
