//! Social security number detector. Grounded on `detectors/ssn.py`.

use super::DetectorDef;

pub const PATTERNS: [DetectorDef; 1] = [("ssn", "personal.pii", r"\b\d{3}-\d{2}-\d{4}\b")];
