//! # Configuration Settings
//!
//! Defines the configuration structure for the gateway synchronization engine.

use crate::errors::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SyncConfig {
    /// Admin API of the gateway being synchronized
    #[validate(nested)]
    pub admin: AdminApiConfig,

    /// Environment name, written into every `env--<name>` tag
    #[validate(length(min = 1, message = "Environment cannot be empty"))]
    pub environment: String,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            admin: AdminApiConfig::default(),
            environment: "default".to_string(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(GatewayError::from)?;

        url::Url::parse(&self.admin.url).map_err(|e| {
            GatewayError::validation_field(
                format!("Admin URL '{}' is not a valid URL: {}", self.admin.url, e),
                "admin.url",
            )
        })?;

        Ok(())
    }
}

/// Gateway admin API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AdminApiConfig {
    /// Base URL of the admin API (e.g., "http://localhost:8001")
    #[validate(length(min = 1, message = "Admin URL cannot be empty"))]
    pub url: String,

    /// Request timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Request timeout must be between 1 and 300 seconds"
    ))]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Connect timeout must be between 1 and 300 seconds"
    ))]
    pub connect_timeout_seconds: u64,
}

impl Default for AdminApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8001".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

impl AdminApiConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "gateway-sync".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}
