//! Credit card number detector. Grounded on `detectors/credit_card.py`.

use super::DetectorDef;

pub const PATTERNS: [DetectorDef; 1] = [(
    "credit_card",
    "personal.financial",
    r"\b(?:\d[ -]*?){13,19}\b",
)];
