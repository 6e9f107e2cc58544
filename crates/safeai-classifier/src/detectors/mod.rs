//! Built-in detector catalogue, grounded on
//! `original_source/safeai/detectors/*.py`.

mod api_key;
mod credit_card;
mod email;
mod phone;
mod ssn;

/// A `(name, tag, pattern)` triple before compilation.
pub type DetectorDef = (&'static str, &'static str, &'static str);

/// All built-in detectors, in the same order the original registers them.
#[must_use]
pub fn all_detectors() -> Vec<DetectorDef> {
    let mut detectors = Vec::new();
    detectors.extend(email::PATTERNS);
    detectors.extend(phone::PATTERNS);
    detectors.extend(ssn::PATTERNS);
    detectors.extend(credit_card::PATTERNS);
    detectors.extend(api_key::PATTERNS);
    detectors
}
