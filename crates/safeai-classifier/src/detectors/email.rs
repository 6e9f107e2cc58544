//! Email address detector. Grounded on `detectors/email.py`.

use super::DetectorDef;

pub const PATTERNS: [DetectorDef; 1] = [(
    "email",
    "personal.pii",
    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
)];
