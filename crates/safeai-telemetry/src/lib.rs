//! Ambient observability for the SafeAI runtime: JSON logging init, the
//! outbound metadata sanitizer (spec component C18), and in-process
//! decision counters (spec.md §4.0b, §6 `/v1/metrics`).
//!
//! Grounded on the teacher's `telemetry` crate for the logging init
//! shape and the atomic-counter style; the sanitizer and decision counters
//! are new surfaces this workspace's spec requires that the teacher has no
//! direct counterpart for.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod logging;
mod metrics;
mod sanitizer;

pub use logging::init_json_logging;
pub use metrics::Metrics;
pub use sanitizer::MetadataSanitizer;
