//! Environment variable secrets backend.
//!
//! Secrets are read from environment variables with the `GATEWAY_SYNC_SECRET_` prefix:
//!
//! ```bash
//! export GATEWAY_SYNC_SECRET_REDIS_PASSWORD="my-password"
//! ```
//!
//! A reference `$<redis-password>` then resolves to `my-password`. Intended for
//! development and tests; production deployments plug their secret store in
//! behind [`SecretsClient`].

use async_trait::async_trait;
use std::env;

use super::client::SecretsClient;
use crate::errors::{GatewayError, Result};

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "GATEWAY_SYNC_SECRET_";

/// Environment variable secrets backend (development only).
#[derive(Debug, Clone, Default)]
pub struct EnvVarSecretsClient {
    // No internal state needed - reads directly from env
}

impl EnvVarSecretsClient {
    /// Creates a new environment variable secrets client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a secret id to the environment variable name.
    ///
    /// Anything outside `[A-Za-z0-9]` becomes `_`.
    fn key_to_env_var(key: &str) -> String {
        let normalized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", SECRET_PREFIX, normalized)
    }
}

#[async_trait]
impl SecretsClient for EnvVarSecretsClient {
    async fn get_secret(&self, key: &str) -> Result<String> {
        let env_var = Self::key_to_env_var(key);

        env::var(&env_var).map_err(|_| {
            GatewayError::secret(key, format!("not found in environment (looking for {})", env_var))
        })
    }
}
