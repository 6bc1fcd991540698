//! Error types for the download API server.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required configuration value
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Configuration value present but unusable
    #[error("Invalid {name}: {reason}")]
    InvalidValue {
        /// Option name
        name: &'static str,
        /// Reason the value was rejected
        reason: String,
    },
}

/// Route pattern compilation errors.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Pattern does not start with a method specification
    #[error("Route pattern '{0}' has no method specification (e.g. 'GET /path')")]
    MissingMethods(String),

    /// Path template compiled to an invalid regular expression
    #[error("Route pattern '{pattern}' is invalid: {source}")]
    InvalidPattern {
        /// Original route pattern
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind HTTP server
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    HttpBindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Route table error
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::MissingRequired("builds file not found: /tmp/x.json".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: builds file not found: /tmp/x.json"
        );

        let err = ConfigError::InvalidValue {
            name: "download base URL",
            reason: "must not be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid download base URL: must not be empty");
    }

    #[test]
    fn test_server_error_conversion() {
        let route_err = RouteError::MissingMethods("/api".to_string());
        let server_err: ServerError = route_err.into();
        assert!(server_err.to_string().contains("no method specification"));
    }
}
