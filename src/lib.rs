//! # Gateway Sync
//!
//! Synchronizes desired-state routes and consumers into a Kong-compatible
//! gateway admin API. Each route or consumer is expanded into a set of
//! prioritized features; the features pick an upstream and compose plugin
//! configs, and a single persistence step writes the result and removes
//! whatever the previous build left behind.
//!
//! ## Architecture
//!
//! ```text
//! Handler → Builder → Features (priority order) → Plugins + side channel
//!                ↓
//!           AdminClient (identity by tags, upsert, cleanup)
//! ```
//!
//! Remote objects are identified by `key--value` tags, so a build that failed
//! halfway converges on the next run without any local state.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gateway_sync::{
//!     DefaultBuilderFactory, EnvVarSecretsClient, KongAdminClient, Result, RouteHandler,
//!     SyncConfig,
//! };
//! use gateway_sync::domain::{Gateway, Realm, Route};
//!
//! async fn sync(route: Route, realm: Realm, gateway: Gateway) -> Result<Route> {
//!     let config = SyncConfig::from_env()?;
//!     let admin = Arc::new(KongAdminClient::from_config(&config)?);
//!     let factory = DefaultBuilderFactory::new(admin, Arc::new(EnvVarSecretsClient::new()));
//!     RouteHandler::new(factory).create_or_update(route, realm, gateway, &[]).await
//! }
//! ```

pub mod admin;
pub mod config;
pub mod domain;
pub mod errors;
pub mod features;
pub mod handler;
pub mod observability;
pub mod plugin;
pub mod secrets;

pub use admin::{AdminClient, KongAdminClient};
pub use config::SyncConfig;
pub use errors::{GatewayError, Result};
pub use features::{Builder, Feature};
pub use handler::{BuilderFactory, ConsumerHandler, DefaultBuilderFactory, RouteHandler};
pub use observability::init_logging;
pub use secrets::{EnvVarSecretsClient, SecretsClient};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
