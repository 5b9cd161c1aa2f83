//! # Error Handling
//!
//! Every step of a synchronization run wraps the error it propagates with the
//! operation and object name, then returns immediately. Callers use
//! [`GatewayError::is_retryable`] to decide between requeueing and giving up.

pub mod types;

pub use types::{GatewayError, Result, ResultExt};
