//! Structured logging init (spec.md §4.0b "Logging (ambient)").
//!
//! Grounded on the teacher's `telemetry::init_json_logging`: a
//! `tracing_subscriber` JSON fmt layer composed with an `EnvFilter` read
//! from `RUST_LOG`, defaulting to `info` when unset or invalid.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Installs the process-global JSON tracing subscriber. Idempotent in the
/// sense that a second call is a harmless no-op (`set_global_default`
/// failures are swallowed, matching the teacher's behavior): the first
/// caller wins.
pub fn init_json_logging() {
    let fmt_layer = fmt::layer().json().with_current_span(true).with_span_list(true);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).ok();
}
