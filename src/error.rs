//! Error types for lmexport

use thiserror::Error;

/// Result type alias for lmexport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown category: {0}. Run `lmexport categories` to list valid keys.")]
    UnknownCategory(String),

    #[error("{failed} of {total} categories failed to export")]
    PartialFailure { failed: usize, total: usize },
}

impl Error {
    /// Whether this error was caused by a cancellation request (Ctrl-C).
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Api(ApiError::Cancelled { .. }))
    }
}

/// API-related errors.
///
/// Every request failure carries the resource path and the last response body
/// (empty when no response was received) so the category marker file is useful
/// on its own.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GET {path} was rejected with HTTP {status} (check ACCESS_ID / ACCESS_KEY): {body}")]
    Auth {
        path: String,
        status: u16,
        body: String,
    },

    #[error("GET {path} still rate limited after {attempts} attempts: {body}")]
    RateLimited {
        path: String,
        attempts: u32,
        body: String,
    },

    #[error("GET {path} failed after {attempts} attempts ({cause}): {body}")]
    Transient {
        path: String,
        attempts: u32,
        cause: String,
        body: String,
    },

    #[error("GET {path} failed with HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Invalid API response from {path}: {reason}")]
    InvalidResponse { path: String, reason: String },

    #[error("Cancelled while waiting on {path}")]
    Cancelled { path: String },

    #[error("Network error: {0}")]
    Network(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing {}. Set them in your environment or a .env file.",
        .0.join(" / ")
    )]
    MissingCredentials(Vec<&'static str>),

    #[error("Failed to load env file {path}: {reason}")]
    EnvFile { path: String, reason: String },

    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_auth_message() {
        let err = ApiError::Auth {
            path: "/setting/datasources".to_string(),
            status: 401,
            body: "bad signature".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/setting/datasources"));
        assert!(msg.contains("401"));
        assert!(msg.contains("bad signature"));
        assert!(msg.contains("ACCESS_KEY"));
    }

    #[test]
    fn test_api_error_rate_limited_message() {
        let err = ApiError::RateLimited {
            path: "/setting/oids".to_string(),
            attempts: 3,
            body: "slow down".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rate limited"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("slow down"));
    }

    #[test]
    fn test_api_error_transient_message() {
        let err = ApiError::Transient {
            path: "/setting/functions".to_string(),
            attempts: 3,
            cause: "HTTP 503".to_string(),
            body: "maintenance".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn test_config_error_missing_credentials_lists_all() {
        let err = ConfigError::MissingCredentials(vec!["ACCESS_ID", "COMPANY"]);
        let msg = err.to_string();
        assert!(msg.contains("ACCESS_ID / COMPANY"));
        assert!(msg.contains(".env"));
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("invalid: [yaml: content")
            .unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }

    #[test]
    fn test_error_is_cancelled() {
        let err: Error = ApiError::Cancelled {
            path: "/setting/oids".to_string(),
        }
        .into();
        assert!(err.is_cancelled());

        let err = Error::UnknownCategory("bogus".to_string());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_partial_failure_message() {
        let err = Error::PartialFailure {
            failed: 1,
            total: 9,
        };
        assert_eq!(err.to_string(), "1 of 9 categories failed to export");
    }
}
