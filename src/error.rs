//! Error types for registration, lookup, provider configuration and proxy calls.

use thiserror::Error;

/// Failure while building or storing a proxy recipe for an interface.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("'{interface}' is a concrete type, only interfaces can be registered as mappers")]
    NotAnInterface { interface: String },

    #[error("mapper '{interface}' has an empty namespace")]
    EmptyNamespace { interface: String },

    #[error("mapper '{interface}' declares method '{method}' more than once")]
    DuplicateMethod { interface: String, method: String },

    #[error("method '{interface}.{method}' declares parameter '{param}' more than once")]
    DuplicateParam {
        interface: String,
        method: String,
        param: String,
    },
}

/// Failure while looking up a mapper proxy.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("type '{interface}' is not known to the mapper registry")]
    NotRegistered { interface: String },

    #[error("registered recipe for '{interface}' does not build the requested type")]
    RecipeMismatch { interface: String },
}

/// Provider configuration errors, raised by `configure()`.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("property '{0}' is required")]
    MissingProperty(&'static str),

    #[error("mapper interface '{configured}' does not match provider type '{expected}'")]
    InterfaceMismatch {
        configured: String,
        expected: String,
    },

    #[error("error while adding mapper '{interface}' to configuration: {source}")]
    Registration {
        interface: String,
        #[source]
        source: RegistrationError,
    },

    #[error("provider for '{0}' failed configuration and cannot be reused")]
    Failed(String),
}

/// Errors from `get_object()`.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider has not been configured")]
    NotConfigured,

    #[error("provider failed configuration and cannot serve objects")]
    Failed,

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Failure reported by a statement executor.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ExecutorError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutorError {
    /// Creates an executor error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an executor error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors raised by calls on a mapper proxy.
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("failed to bind parameter '{param}': {source}")]
    Bind {
        param: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("method '{method}' is not bound on mapper '{interface}'")]
    UnknownMethod { interface: String, method: String },

    #[error("statement '{statement}' failed: {source}")]
    Execution {
        statement: String,
        #[source]
        source: ExecutorError,
    },

    #[error("failed to decode result of '{statement}': {source}")]
    Decode {
        statement: String,
        #[source]
        source: serde_json::Error,
    },
}
