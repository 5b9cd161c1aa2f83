//! Core secrets client trait and reference resolution.

use async_trait::async_trait;

use crate::errors::Result;

/// Opening marker of a secret reference
pub const REFERENCE_START: &str = "$<";

/// Closing marker of a secret reference
pub const REFERENCE_END: &str = ">";

/// Trait for secrets backends.
///
/// Implementations MUST NOT log secret values.
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Retrieve a secret value by its id.
    ///
    /// Returns [`GatewayError::Secret`](crate::errors::GatewayError::Secret) when
    /// the backend has no such secret.
    async fn get_secret(&self, key: &str) -> Result<String>;
}

/// Returns the secret id when `value` is written as `$<id>`.
pub fn secret_reference(value: &str) -> Option<&str> {
    value
        .strip_prefix(REFERENCE_START)
        .and_then(|rest| rest.strip_suffix(REFERENCE_END))
}

/// Resolve a configured credential.
///
/// References are looked up in the backend, literal values are returned as
/// they are. An empty value stays empty.
pub async fn resolve_secret(client: &dyn SecretsClient, value: &str) -> Result<String> {
    match secret_reference(value) {
        Some(id) => client.get_secret(id).await,
        None => Ok(value.to_string()),
    }
}
