//! `SecretManager` — registry of named backends, resolution gated by
//! capability scope (spec.md §4.9).

use std::collections::HashMap;
use std::sync::RwLock;

use safeai_capability::CapabilityTokenManager;

use crate::backend::{EnvSecretBackend, SecretBackend};
use crate::error::SecretError;
use crate::resolved::ResolvedSecret;

/// Registry of named [`SecretBackend`]s. The `"env"` backend is always
/// preinstalled.
pub struct SecretManager {
    backends: RwLock<HashMap<String, Box<dyn SecretBackend>>>,
}

impl Default for SecretManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretManager {
    /// Builds a manager with only the built-in `"env"` backend registered.
    #[must_use]
    pub fn new() -> Self {
        let mut backends: HashMap<String, Box<dyn SecretBackend>> = HashMap::new();
        backends.insert("env".to_string(), Box::new(EnvSecretBackend));
        Self { backends: RwLock::new(backends) }
    }

    /// Registers (or replaces) a named backend.
    pub fn register_backend(&self, name: impl Into<String>, backend: Box<dyn SecretBackend>) {
        self.backends.write().expect("secret backend lock poisoned").insert(name.into(), backend);
    }

    /// Resolves one secret, validating capability scope first
    /// (spec.md §4.9 steps 1-4):
    /// 1. Capability must validate for `(agent_id, tool_name, action,
    ///    session_id)`.
    /// 2. The token's `scope.secret_keys` must be non-empty.
    /// 3. `secret_key` must be a member of `scope.secret_keys`.
    /// 4. The backend must have a value for `secret_key`.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_secret(
        &self,
        capabilities: &CapabilityTokenManager,
        token_id: &str,
        secret_key: &str,
        agent_id: &str,
        tool_name: &str,
        action: &str,
        session_id: Option<&str>,
        backend: &str,
    ) -> Result<ResolvedSecret, SecretError> {
        let capability = capabilities.validate(token_id, agent_id, tool_name, action, session_id);
        if !capability.allowed {
            return Err(SecretError::SecretAccessDenied(capability.reason));
        }
        let token = capabilities
            .get(token_id)
            .ok_or_else(|| SecretError::SecretAccessDenied("capability token vanished".to_string()))?;
        if token.scope.secret_keys.is_empty() {
            return Err(SecretError::SecretAccessDenied(
                "capability token does not grant secret-key access".to_string(),
            ));
        }
        if !token.scope.secret_keys.contains(&secret_key.to_lowercase()) {
            return Err(SecretError::SecretAccessDenied(format!(
                "capability token does not authorize secret key '{secret_key}'"
            )));
        }
        let backends = self.backends.read().expect("secret backend lock poisoned");
        let backend = backends
            .get(backend)
            .ok_or_else(|| SecretError::BackendNotFound(backend.to_string()))?;
        let value = backend.get_secret(secret_key)?;
        Ok(ResolvedSecret::new(secret_key, value))
    }
}
