//! `SecretBackend` trait and the built-in backends.
//!
//! Grounded on `original_source/safeai/secrets/{base,env,aws}.py`: a
//! `Protocol`-shaped backend trait, an always-installed `env` backend, and
//! a cloud backend whose key grammar (`aws://secret-id#field`) is
//! validated without a real cloud SDK dependency.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::SecretError;

/// Something that can resolve a named secret to its plaintext value.
pub trait SecretBackend: Send + Sync {
    /// Returns the plaintext value for `key`, or `SecretNotFound`.
    fn get_secret(&self, key: &str) -> Result<String, SecretError>;
}

/// Resolves secrets from process environment variables. Always installed
/// under the name `"env"`.
#[derive(Debug, Default)]
pub struct EnvSecretBackend;

impl SecretBackend for EnvSecretBackend {
    fn get_secret(&self, key: &str) -> Result<String, SecretError> {
        std::env::var(key).map_err(|_| SecretError::SecretNotFound(key.to_string()))
    }
}

/// In-memory key/value backend, for local development and tests standing
/// in for a real secret store (Vault, SSM, …).
#[derive(Debug, Default)]
pub struct KvSecretBackend {
    values: RwLock<HashMap<String, String>>,
}

impl KvSecretBackend {
    /// Builds an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a key/value pair.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().expect("kv backend lock poisoned").insert(key.into(), value.into());
    }
}

impl SecretBackend for KvSecretBackend {
    fn get_secret(&self, key: &str) -> Result<String, SecretError> {
        self.values
            .read()
            .expect("kv backend lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| SecretError::SecretNotFound(key.to_string()))
    }
}

/// Parses the `aws://secret-id#field` key grammar used by the cloud
/// backend, without depending on a real AWS SDK.
fn parse_cloud_key(key: &str) -> Result<(&str, &str), SecretError> {
    let rest = key
        .strip_prefix("aws://")
        .ok_or_else(|| SecretError::SecretNotFound(key.to_string()))?;
    rest.split_once('#')
        .filter(|(id, field)| !id.is_empty() && !field.is_empty())
        .ok_or_else(|| SecretError::SecretNotFound(key.to_string()))
}

/// A cloud secret client contributes the actual lookup; this crate wires
/// only the `aws://id#field` key grammar around it.
pub trait CloudSecretClient: Send + Sync {
    /// Fetches the raw JSON-ish secret document for `secret_id`.
    fn get_secret_value(&self, secret_id: &str) -> Result<HashMap<String, String>, SecretError>;
}

/// Backend resolving `aws://secret-id#field` keys through a
/// [`CloudSecretClient`].
pub struct CloudSecretBackend {
    client: Box<dyn CloudSecretClient>,
}

impl CloudSecretBackend {
    /// Wraps a client implementation.
    #[must_use]
    pub fn new(client: Box<dyn CloudSecretClient>) -> Self {
        Self { client }
    }
}

impl SecretBackend for CloudSecretBackend {
    fn get_secret(&self, key: &str) -> Result<String, SecretError> {
        let (secret_id, field) = parse_cloud_key(key)?;
        let document = self.client.get_secret_value(secret_id)?;
        document.get(field).cloned().ok_or_else(|| SecretError::SecretNotFound(key.to_string()))
    }
}
