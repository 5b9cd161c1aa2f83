//! Gateway and realm settings a build reads from

use serde::{Deserialize, Serialize};

use super::route::CircuitBreakerSettings;

/// Gateway-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Gateway {
    pub name: String,
    /// Shared counter store for rate limiting across gateway replicas
    pub redis: RedisSettings,
    /// Default circuit breaker switch, routes may override it
    pub circuit_breaker: CircuitBreakerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    /// Literal password or `$<id>` secret reference
    pub password: String,
    #[serde(rename = "enableTLS")]
    pub enable_tls: bool,
}

/// Identity realm a route belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Realm {
    pub name: String,
    pub url: String,
    pub issuer_url: String,
    /// Consumers admitted to every route of the realm
    pub default_consumers: Vec<String>,
}
