//! Error types for obs-connect
//!
//! Provides structured error handling for both the host runtime (CLI) and
//! the plugins it drives.
//!
//! Plugin operations fail in three distinct ways:
//! - configuration problems are *not* errors; they are accumulated in a
//!   [`FailureCollector`](crate::traits::failure::FailureCollector)
//! - malformed arguments (paths) raise [`ConnectorError::InvalidArgument`]
//! - storage client errors are carried untouched in [`ConnectorError::Client`]

use crate::traits::failure::ValidationException;
use thiserror::Error;

/// Result type alias for the host runtime
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Result type alias for plugin operations
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;

/// Main error type for the host runtime
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Named plugin (connection, source or sink) error
    #[error("Plugin '{name}' error: {message}")]
    Plugin { name: String, message: String },
}

/// Errors that can occur in plugin operations
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A caller supplied a malformed argument (for example a storage path)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be interpreted
    #[error("configuration error: {0}")]
    Config(String),

    /// Accumulated validation failures
    #[error(transparent)]
    Validation(#[from] ValidationException),

    /// Error raised by the underlying storage client, kept as-is
    #[error("{0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The connector has released its client handle
    #[error("connector is closed")]
    Closed,

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConnectorError {
    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a storage client error without translating it
    pub fn client(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Client(Box::new(err))
    }

    /// Check if this error was raised by the storage client
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client(_))
    }

    /// Borrow the storage client error, if this is one
    pub fn client_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Client(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl ConnectError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a named plugin error
    pub fn plugin(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Plugin {
            name: name.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("service said no")]
    struct FakeClientError;

    #[test]
    fn test_error_display() {
        let err = ConnectError::plugin("orders", "path must start with obs://");
        assert_eq!(
            err.to_string(),
            "Plugin 'orders' error: path must start with obs://"
        );
    }

    #[test]
    fn test_client_error_kept_untranslated() {
        let err = ConnectorError::client(FakeClientError);
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "service said no");
        assert!(err.client_error::<FakeClientError>().is_some());
        assert!(err.client_error::<std::io::Error>().is_none());
    }

    #[test]
    fn test_invalid_argument() {
        let err = ConnectorError::invalid_argument("empty path");
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "invalid argument: empty path");
    }
}
