//! # Observability Infrastructure
//!
//! Structured logging for synchronization runs. Spans carry the route or
//! consumer name and a per-build id so admin calls can be correlated.

pub mod logging;

pub use logging::{init_logging, log_config_info};
