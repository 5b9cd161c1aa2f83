//! # Configuration Management
//!
//! Settings are layered: built-in defaults first, then `GATEWAY_SYNC_*`
//! environment variables. Nested keys use a double underscore, so
//! `GATEWAY_SYNC_ADMIN__URL` sets `admin.url`.

pub mod settings;

pub use settings::{AdminApiConfig, ObservabilityConfig, SyncConfig};

use crate::errors::Result;

/// Environment variable prefix for configuration
pub const ENV_PREFIX: &str = "GATEWAY_SYNC";

impl SyncConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    pub(crate) fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&SyncConfig::default())?)
            .add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: SyncConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
