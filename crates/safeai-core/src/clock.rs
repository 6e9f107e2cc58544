//! Injectable clock, shared by every component with a TTL (capability
//! tokens, approval requests, memory entries).

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Anything that can report the current time. Production code uses
/// [`SystemClock`]; tests inject a fixed or steppable implementation.
pub trait Clock: Send + Sync {
    /// The current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared handle to a [`Clock`], cheap to clone and pass into managers.
pub type SharedClock = Arc<dyn Clock>;

/// Builds the default production clock handle.
#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
