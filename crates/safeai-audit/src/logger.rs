//! `AuditLogger` — serialized JSONL append with isolated emit callbacks.
//!
//! Grounded on `original_source/safeai/core/audit.py`'s `AuditLogger.emit`
//! and on ORCA `event-log`'s `JsonlEventLog` (open-or-create, append with a
//! trailing newline, flush before returning).

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use safeai_core::Result;

use crate::event::AuditEvent;

type Callback = Arc<dyn Fn(&AuditEvent) + Send + Sync>;

/// Append-only JSONL audit writer. One lock serializes writes so concurrent
/// emitters never interleave lines (spec.md §5).
pub struct AuditLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
    callbacks: RwLock<Vec<Callback>>,
}

impl AuditLogger {
    /// Opens (creating if absent) the JSONL file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, write_lock: Mutex::new(()), callbacks: RwLock::new(Vec::new()) })
    }

    /// Registers a callback invoked after every successful emit. Callback
    /// panics are caught and logged via `tracing`, never propagated to the
    /// caller and never allowed to block subsequent writes (spec.md §4.4).
    pub fn on_emit(&self, callback: impl Fn(&AuditEvent) + Send + Sync + 'static) {
        self.callbacks.write().expect("audit callbacks lock poisoned").push(Arc::new(callback));
    }

    /// Appends `event` as one compact JSON line and runs registered
    /// callbacks. Returns the event unchanged for convenience.
    pub fn emit(&self, event: AuditEvent) -> Result<AuditEvent> {
        let line = serde_json::to_string(&event)?;
        {
            let _guard = self.write_lock.lock().expect("audit write lock poisoned");
            let mut file = OpenOptions::new().append(true).open(&self.path)?;
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
            file.flush()?;
        }
        self.run_callbacks(&event);
        Ok(event)
    }

    fn run_callbacks(&self, event: &AuditEvent) {
        let callbacks = self.callbacks.read().expect("audit callbacks lock poisoned").clone();
        for callback in callbacks {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(event)));
            if outcome.is_err() {
                tracing::warn!(event_id = %event.event_id, "audit on_emit callback panicked; isolated");
            }
        }
    }

    /// Path to the backing JSONL file, for [`crate::query`] and tests.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
