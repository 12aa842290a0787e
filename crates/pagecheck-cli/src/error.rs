//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Stored value could not be read as a record list
    #[error("'{key}' does not hold a record list: {reason}")]
    MalformedRecords {
        /// Storage key
        key: String,
        /// Parse error
        reason: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pagecheck library error
    #[error(transparent)]
    Pagecheck(#[from] pagecheck::PagecheckError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Error for commands that need a live browser in a build without one
    #[must_use]
    pub fn browser_disabled(command: &str) -> Self {
        Self::config(format!(
            "`{command}` needs a browser; rebuild with the `browser` feature"
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_browser_disabled_names_command() {
        let err = CliError::browser_disabled("records");
        assert!(err.to_string().contains("`records`"));
        assert!(err.to_string().contains("browser"));
    }

    #[test]
    fn test_library_error_is_transparent() {
        let err: CliError = pagecheck::PagecheckError::config("poll_interval_ms must be positive").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: poll_interval_ms must be positive"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
