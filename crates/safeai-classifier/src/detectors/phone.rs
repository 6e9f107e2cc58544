//! Phone number detector. Grounded on `detectors/phone.py`.

use super::DetectorDef;

pub const PATTERNS: [DetectorDef; 1] = [(
    "phone",
    "personal.pii",
    r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
)];
