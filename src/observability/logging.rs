//! # Structured Logging
//!
//! Provides structured logging macros and subscriber setup using the tracing ecosystem.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ObservabilityConfig, SyncConfig};
use crate::errors::Result;

/// Create a tracing span for one builder invocation.
///
/// ```rust,ignore
/// let span = build_span!("route", route.name);
/// ```
#[macro_export]
macro_rules! build_span {
    ($kind:expr, $name:expr) => {
        tracing::info_span!(
            "gateway_build",
            kind = %$kind,
            name = %$name,
            build_id = %uuid::Uuid::new_v4()
        )
    };
    ($kind:expr, $name:expr, $($field:tt)*) => {
        tracing::info_span!(
            "gateway_build",
            kind = %$kind,
            name = %$name,
            build_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for a single admin API call
#[macro_export]
macro_rules! admin_span {
    ($method:expr, $path:expr) => {
        tracing::debug_span!(
            "admin_request",
            method = %$method,
            path = %$path,
            request_id = %uuid::Uuid::new_v4()
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. Installing twice (tests,
/// embedding applications) is not an error.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            crate::errors::GatewayError::config_with_source(
                format!("Invalid log level '{}'", config.log_level),
                Box::new(e),
            )
        })?;

    let installed = if config.json_logging {
        fmt().json().with_env_filter(filter).with_current_span(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    if installed.is_err() {
        // Subscriber already set elsewhere; keep it.
        tracing::debug!("global tracing subscriber already installed");
    }

    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &SyncConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        admin_url = %config.admin.url,
        environment = %config.environment,
        timeout_seconds = config.admin.timeout_seconds,
        json_logging = config.observability.json_logging,
        "Gateway synchronization configuration"
    );
}
