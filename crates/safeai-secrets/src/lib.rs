//! Secret manager (spec component C9): pluggable backends, resolution
//! gated by a matching capability token's `secret_keys` scope.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod manager;
mod resolved;

pub use backend::{CloudSecretBackend, CloudSecretClient, EnvSecretBackend, KvSecretBackend, SecretBackend};
pub use error::SecretError;
pub use manager::SecretManager;
pub use resolved::ResolvedSecret;

#[cfg(test)]
mod tests {
    use safeai_capability::CapabilityTokenManager;

    use super::*;

    #[test]
    fn resolve_succeeds_when_capability_grants_key() {
        let capabilities = CapabilityTokenManager::new();
        let token = capabilities
            .issue(
                "agent-1",
                "search",
                ["invoke".to_string()],
                "1h",
                ["openai_api_key".to_string()],
                None,
                serde_json::json!({}),
            )
            .unwrap();
        std::env::set_var("openai_api_key", "sk-topsecret");

        let secrets = SecretManager::new();
        let resolved = secrets
            .resolve_secret(
                &capabilities,
                &token.token_id,
                "openai_api_key",
                "agent-1",
                "search",
                "invoke",
                None,
                "env",
            )
            .unwrap();
        assert_eq!(resolved.expose(), "sk-topsecret");
    }

    #[test]
    fn resolve_denied_when_key_not_in_scope() {
        let capabilities = CapabilityTokenManager::new();
        let token = capabilities
            .issue("agent-1", "search", ["invoke".to_string()], "1h", [], None, serde_json::json!({}))
            .unwrap();
        let secrets = SecretManager::new();
        let result = secrets.resolve_secret(
            &capabilities,
            &token.token_id,
            "anything",
            "agent-1",
            "search",
            "invoke",
            None,
            "env",
        );
        assert!(matches!(result, Err(SecretError::SecretAccessDenied(_))));
    }

    #[test]
    fn kv_backend_round_trips() {
        let capabilities = CapabilityTokenManager::new();
        let token = capabilities
            .issue(
                "agent-1",
                "search",
                ["invoke".to_string()],
                "1h",
                ["db_password".to_string()],
                None,
                serde_json::json!({}),
            )
            .unwrap();
        let secrets = SecretManager::new();
        let kv = KvSecretBackend::new();
        kv.set("db_password", "hunter2");
        secrets.register_backend("kv", Box::new(kv));

        let resolved = secrets
            .resolve_secret(
                &capabilities,
                &token.token_id,
                "db_password",
                "agent-1",
                "search",
                "invoke",
                None,
                "kv",
            )
            .unwrap();
        assert_eq!(resolved.expose(), "hunter2");
    }
}
