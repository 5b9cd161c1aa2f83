//! # Secrets
//!
//! Credentials in the desired state (Redis password, basic-auth passwords,
//! identity provider client secrets) are either literal values or references
//! of the form `$<id>`. References are resolved through a [`SecretsClient`]
//! right before they are written into a plugin payload.

pub mod client;
pub mod env;

pub use client::{resolve_secret, secret_reference, SecretsClient};
pub use env::EnvVarSecretsClient;
