//! Result and error types for pagecheck.

use thiserror::Error;

/// Result type for pagecheck operations
pub type PagecheckResult<T> = Result<T, PagecheckError>;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum PagecheckError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Session (tab/context) error
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched within the actionability timeout
    #[error("{action} on {locator} failed after {timeout_ms}ms: {last_observed}")]
    LocatorNotFound {
        /// Action being attempted
        action: String,
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Why the element was not actionable on the last attempt
        last_observed: String,
    },

    /// A single-element action matched several elements
    #[error("{action} on {locator}: strict mode violation, {count} elements matched")]
    StrictModeViolation {
        /// Action being attempted
        action: String,
        /// Locator description
        locator: String,
        /// Number of matched elements
        count: usize,
    },

    /// Expected condition never held within the timeout
    #[error("expect({target}).{expectation} timed out after {timeout_ms}ms, last observed: {last_observed}")]
    AssertionTimeout {
        /// What was asserted on
        target: String,
        /// Expectation description
        expectation: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Last observed value
        last_observed: String,
    },

    /// Persisted-state predicate never satisfied
    #[error("storage '{key}' did not converge to {predicate} within {timeout_ms}ms ({attempts} samples), last snapshot: {last_snapshot}")]
    ConvergenceTimeout {
        /// Storage key that was sampled
        key: String,
        /// Predicate description
        predicate: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Number of samples taken
        attempts: u32,
        /// Last observed snapshot
        last_snapshot: crate::convergence::Observed,
    },

    /// Script evaluation error
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Screenshot baseline mismatch
    #[error("Screenshot '{name}' does not match baseline {baseline} (actual written to {actual})")]
    SnapshotMismatch {
        /// Snapshot name
        name: String,
        /// Baseline path
        baseline: String,
        /// Path the actual capture was written to
        actual: String,
    },

    /// Screenshot baseline missing and updates disabled
    #[error("Screenshot baseline {path} is missing, rerun with update_snapshots enabled")]
    SnapshotMissing {
        /// Baseline path
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A whole case ran past its timeout
    #[error("case '{name}' timed out after {timeout_ms}ms")]
    CaseTimeout {
        /// Case name
        name: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PagecheckError {
    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create a navigation error
    #[must_use]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Whether this error came from a bounded wait running out of time
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::LocatorNotFound { .. }
                | Self::AssertionTimeout { .. }
                | Self::ConvergenceTimeout { .. }
                | Self::CaseTimeout { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::convergence::Observed;

    #[test]
    fn test_navigation_error_names_url() {
        let err = PagecheckError::navigation("https://example.test", "net::ERR_NAME_NOT_RESOLVED");
        let text = err.to_string();
        assert!(text.contains("https://example.test"));
        assert!(text.contains("ERR_NAME_NOT_RESOLVED"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_locator_not_found_reports_last_observed() {
        let err = PagecheckError::LocatorNotFound {
            action: "click".into(),
            locator: "get_by_label(\"Search\")".into(),
            timeout_ms: 5000,
            last_observed: "no element matched".into(),
        };
        let text = err.to_string();
        assert!(text.contains("click"));
        assert!(text.contains("Search"));
        assert!(text.contains("no element matched"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_convergence_timeout_reports_snapshot() {
        let err = PagecheckError::ConvergenceTimeout {
            key: "react-todos".into(),
            predicate: "record count == 3".into(),
            timeout_ms: 100,
            attempts: 3,
            last_snapshot: Observed::Absent,
        };
        let text = err.to_string();
        assert!(text.contains("react-todos"));
        assert!(text.contains("record count == 3"));
        assert!(text.contains("absent"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "baseline");
        let err: PagecheckError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
