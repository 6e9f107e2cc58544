//! Alert delivery channels (spec.md §4.14 "Dispatch to every configured
//! channel; channel exceptions are caught").
//!
//! Grounded on `original_source/safeai/alerting/channels.py`: `FileChannel`,
//! `WebhookChannel`, `SlackChannel`, `dispatch_alert`.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::alert::Alert;

/// Something an [`Alert`] can be sent to. `send` must never panic; a
/// channel that cannot deliver returns `false` rather than propagating an
/// error (spec.md §4.14).
pub trait AlertChannel: Send + Sync {
    /// Attempts delivery, returning whether it succeeded.
    fn send(&self, alert: &Alert) -> bool;
}

/// Appends alerts as compact JSON lines to a file. Mirrors the original's
/// `FileChannel.send` exactly (create parent dirs, append, one line).
pub struct FileChannel {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileChannel {
    /// Targets the given file path, creating parent directories lazily on
    /// first send.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }
}

impl AlertChannel for FileChannel {
    fn send(&self, alert: &Alert) -> bool {
        let _guard = self.write_lock.lock().expect("alert file channel lock poisoned");
        let Ok(line) = serde_json::to_string(alert) else { return false };
        if let Some(parent) = self.path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return false;
            }
        }
        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) else {
            return false;
        };
        file.write_all(line.as_bytes()).is_ok() && file.write_all(b"\n").is_ok()
    }
}

/// POSTs the alert as JSON to a generic HTTP endpoint. Uses a fresh
/// default-configured `ureq::Agent` per send, the way
/// `riverline-labs-tenor`'s `HttpAdapter` calls out over HTTP.
pub struct WebhookChannel {
    url: String,
}

impl WebhookChannel {
    /// Targets `url`, matching the original's `WebhookChannel(url,
    /// timeout=5.0)` modulo the fixed timeout this agent configuration
    /// already applies.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl AlertChannel for WebhookChannel {
    fn send(&self, alert: &Alert) -> bool {
        let agent = ureq::Agent::new_with_defaults();
        agent
            .post(&self.url)
            .send_json(alert)
            .map(|r| (200..300).contains(&r.status().as_u16()))
            .unwrap_or(false)
    }
}

/// POSTs a formatted text summary to a Slack incoming webhook URL. The
/// template mirrors `SlackChannel.send`'s text format exactly.
pub struct SlackChannel {
    webhook_url: String,
}

impl SlackChannel {
    /// Targets a Slack incoming webhook URL.
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self { webhook_url: webhook_url.into() }
    }
}

impl AlertChannel for SlackChannel {
    fn send(&self, alert: &Alert) -> bool {
        let text = format!(
            ":rotating_light: *SafeAI Alert*\n*Rule:* {} (`{}`)\n*Events:* {} in {}\n*Alert ID:* {}",
            alert.rule_name, alert.rule_id, alert.count, alert.window, alert.alert_id
        );
        let agent = ureq::Agent::new_with_defaults();
        agent
            .post(&self.webhook_url)
            .send_json(serde_json::json!({ "text": text }))
            .map(|r| (200..300).contains(&r.status().as_u16()))
            .unwrap_or(false)
    }
}

/// Dispatches `alert` to every channel in `channels`, isolating each
/// failure rather than letting one bad channel block the rest
/// (spec.md §4.14).
#[must_use]
pub fn dispatch_alert(
    alert: &Alert,
    channels: &HashMap<String, Box<dyn AlertChannel>>,
    names: &[String],
) -> HashMap<String, bool> {
    let mut results = HashMap::new();
    for name in names {
        let Some(channel) = channels.get(name) else {
            results.insert(name.clone(), false);
            continue;
        };
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| channel.send(alert)));
        results.insert(name.clone(), outcome.unwrap_or(false));
    }
    results
}
