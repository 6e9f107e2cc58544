//! Cross-crate S5-style scenario (spec.md §8): a capability token scopes
//! secret resolution, and expiry makes every subsequent resolution fail,
//! monotonically, with no path back to success (spec.md §8 invariant 6).

use std::sync::Arc;

use safeai_capability::CapabilityTokenManager;
use safeai_core::{Clock, SharedClock};
use safeai_secrets::{KvSecretBackend, SecretError, SecretManager};

struct FixedClock(std::sync::Mutex<chrono::DateTime<chrono::Utc>>);

impl Clock for FixedClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        *self.0.lock().unwrap()
    }
}

#[test]
fn resolve_secret_requires_capability_scoped_key() {
    let capabilities = CapabilityTokenManager::new();
    let secrets = SecretManager::new();
    let backend = KvSecretBackend::new();
    backend.set("SMTP_TOKEN", "hunter2");
    secrets.register_backend("kv", Box::new(backend));

    let token = capabilities
        .issue(
            "agent-1",
            "send_email",
            ["invoke".to_string()],
            "10m",
            ["SMTP_TOKEN".to_string()],
            None,
            serde_json::json!({}),
        )
        .unwrap();

    let resolved = secrets
        .resolve_secret(&capabilities, &token.token_id, "SMTP_TOKEN", "agent-1", "send_email", "invoke", None, "kv")
        .unwrap();
    assert_eq!(resolved.expose(), "hunter2");
    assert!(!format!("{resolved}").contains("hunter2"));
    assert!(!format!("{resolved:?}").contains("hunter2"));

    let denied = secrets.resolve_secret(
        &capabilities,
        &token.token_id,
        "OTHER_KEY",
        "agent-1",
        "send_email",
        "invoke",
        None,
        "kv",
    );
    assert!(matches!(denied, Err(SecretError::SecretAccessDenied(_))));
}

#[test]
fn expired_capability_token_never_resolves_again() {
    let fixed = Arc::new(FixedClock(std::sync::Mutex::new(chrono::Utc::now())));
    let clock: SharedClock = fixed.clone();
    let capabilities = CapabilityTokenManager::with_clock(clock);
    let secrets = SecretManager::new();
    let backend = KvSecretBackend::new();
    backend.set("SMTP_TOKEN", "hunter2");
    secrets.register_backend("kv", Box::new(backend));

    let token = capabilities
        .issue(
            "agent-1",
            "send_email",
            ["invoke".to_string()],
            "10m",
            ["SMTP_TOKEN".to_string()],
            None,
            serde_json::json!({}),
        )
        .unwrap();

    assert!(secrets
        .resolve_secret(&capabilities, &token.token_id, "SMTP_TOKEN", "agent-1", "send_email", "invoke", None, "kv")
        .is_ok());

    *fixed.0.lock().unwrap() += chrono::Duration::minutes(11);

    let result = secrets.resolve_secret(
        &capabilities,
        &token.token_id,
        "SMTP_TOKEN",
        "agent-1",
        "send_email",
        "invoke",
        None,
        "kv",
    );
    assert!(matches!(result, Err(SecretError::SecretAccessDenied(ref reason)) if reason.contains("expired")));
}
