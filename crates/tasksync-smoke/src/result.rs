//! Result and error types for smoke scenarios.

use thiserror::Error;

/// Result type for smoke-test operations
pub type SmokeResult<T> = Result<T, SmokeError>;

/// Errors that can occur while driving a scenario.
///
/// Every variant is fatal to the scenario that raised it and to nothing else;
/// the scenario runner converts it into a failed [`crate::ScenarioResult`].
#[derive(Debug, Error)]
pub enum SmokeError {
    /// Grid credentials were not supplied
    #[error("Missing grid credentials: set {variable}")]
    MissingCredentials {
        /// Environment variable that was absent
        variable: &'static str,
    },

    /// Remote session could not be created
    #[error("Failed to start remote session: {message}")]
    SessionStart {
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

    /// A bounded wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        waited_for: String,
    },

    /// A mandatory element was not present
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// The seeded document never showed up in the task list
    #[error("Failed to sync test document {doc_id} from Ditto Cloud")]
    SyncTimeout {
        /// Document identifier that was waited for
        doc_id: String,
    },

    /// The task created through the UI never rendered
    #[error("Created task did not appear: {label}")]
    TaskNotCreated {
        /// Label that was typed into the input
        label: String,
    },

    /// A WebDriver command failed
    #[error("WebDriver command failed: {message}")]
    Command {
        /// Error message
        message: String,
    },

    /// Session was used after release
    #[error("Session already released")]
    SessionReleased,

    /// Browser matrix could not be parsed
    #[error("Invalid browser matrix: {message}")]
    Matrix {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmokeError {
    /// Create a WebDriver command error
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Create an element-not-found error
    #[must_use]
    pub fn element_not_found(locator: impl std::fmt::Display) -> Self {
        Self::ElementNotFound {
            locator: locator.to_string(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(ms: u64, waited_for: impl Into<String>) -> Self {
        Self::Timeout {
            ms,
            waited_for: waited_for.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_names_variable() {
        let err = SmokeError::MissingCredentials {
            variable: "BROWSERSTACK_USERNAME",
        };
        assert!(err.to_string().contains("BROWSERSTACK_USERNAME"));
    }

    #[test]
    fn test_timeout_message() {
        let err = SmokeError::timeout(30_000, "document ready");
        assert_eq!(
            err.to_string(),
            "Timed out after 30000ms waiting for document ready"
        );
    }

    #[test]
    fn test_sync_timeout_message() {
        let err = SmokeError::SyncTimeout {
            doc_id: "github_test_42_7".to_string(),
        };
        assert!(err.to_string().contains("github_test_42_7"));
        assert!(err.to_string().contains("Ditto Cloud"));
    }

    #[test]
    fn test_element_not_found_uses_display() {
        let err = SmokeError::element_not_found("css `div.group span`");
        assert!(err.to_string().contains("div.group span"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SmokeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
