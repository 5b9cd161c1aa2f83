//! # Error Types
//!
//! Error types for the gateway synchronization engine using `thiserror`.

/// Custom result type for synchronization operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the synchronization engine
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Desired state that cannot be translated into gateway objects
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A route build was started without a route
    #[error("no route found in builder context")]
    NoRoute,

    /// A consumer build was started without a consumer
    #[error("no consumer found in builder context")]
    NoConsumer,

    /// No feature selected an upstream for the route
    #[error("upstream is not set")]
    UpstreamNotSet,

    /// More than one remote plugin carries the tag set of a single plugin
    #[error("found multiple plugins with tags: {}", tags.join(","))]
    AmbiguousIdentity { tags: Vec<String> },

    /// Admin API answered with an unexpected status
    #[error("HTTP error: {operation} failed (status: {status}): {body}")]
    Http {
        operation: String,
        status: u16,
        body: String,
    },

    /// Admin API could not be reached
    #[error("Transport error: {context}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Secret lookup failures
    #[error("Secret error: cannot resolve '{key}': {message}")]
    Secret { key: String, message: String },

    /// An error wrapped with the operation and object it happened in
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an HTTP error from an admin API response
    pub fn http<O: Into<String>, B: Into<String>>(operation: O, status: u16, body: B) -> Self {
        Self::Http { operation: operation.into(), status, body: body.into() }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(context: S, source: reqwest::Error) -> Self {
        Self::Transport { context: context.into(), source }
    }

    /// Create a secret resolution error
    pub fn secret<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::Secret { key: key.into(), message: message.into() }
    }

    /// Wrap this error with the operation it happened in
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        Self::Context { context: context.into(), source: Box::new(self) }
    }

    /// The innermost error, skipping context wrappers
    pub fn root(&self) -> &GatewayError {
        match self {
            GatewayError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Get the remote status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            GatewayError::Http { status, .. } => Some(*status),
            GatewayError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error should be retried by the caller
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            GatewayError::Http { status, .. } => *status >= 500,
            GatewayError::Transport { .. } => true,
            _ => false,
        }
    }
}

/// Attach operation context to fallible results
pub trait ResultExt<T> {
    /// Wrap the error with a static message
    fn context<S: Into<String>>(self, context: S) -> Result<T>;

    /// Wrap the error with a lazily built message
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { context: "JSON serialization failed".to_string(), source: error }
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
