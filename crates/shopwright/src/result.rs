//! Result and error types for shopwright.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for shopwright operations
pub type ShopResult<T> = Result<T, ShopError>;

/// Errors that can occur while driving or verifying a page
#[derive(Debug, Error)]
pub enum ShopError {
    /// No element matched the selector within the wait window
    #[error("Element not found: {selector} did not become {state} within {timeout_ms}ms")]
    ElementNotFound {
        /// Selector description
        selector: String,
        /// Awaited state ("attached" or "visible")
        state: String,
        /// Wait window in milliseconds
        timeout_ms: u64,
    },

    /// Navigation did not complete
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Required environment value is absent or blank
    #[error("Fixture missing: environment variable {variable} is not set")]
    FixtureMissing {
        /// Variable name
        variable: String,
    },

    /// Expected UI state did not materialize within the bound
    #[error(
        "Assertion timed out after {attempts} attempt(s) ({timeout_ms}ms): expected {selector} {expected}, got {actual}"
    )]
    AssertionTimeout {
        /// Selector (or "page url") the assertion observed
        selector: String,
        /// Expected state description
        expected: String,
        /// Last observed state
        actual: String,
        /// Polls performed
        attempts: usize,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Handle was used after its session navigated away
    #[error("Stale element: {selector} was resolved before the last navigation")]
    StaleElement {
        /// Selector description
        selector: String,
    },

    /// Whole-case bound exceeded
    #[error("Test case timed out after {ms}ms")]
    CaseTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Session backend error
    #[error("Session error: {message}")]
    Session {
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

impl ShopError {
    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Classify this error for reporting
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::ElementNotFound { .. } => FailureKind::ElementNotFound,
            Self::NavigationError { .. } => FailureKind::NavigationError,
            Self::FixtureMissing { .. } => FailureKind::FixtureMissing,
            Self::AssertionTimeout { .. } => FailureKind::AssertionTimeout,
            Self::StaleElement { .. } => FailureKind::StaleElement,
            Self::CaseTimeout { .. } => FailureKind::CaseTimeout,
            Self::BrowserLaunch { .. }
            | Self::Session { .. }
            | Self::Io(_)
            | Self::Json(_) => FailureKind::Session,
        }
    }

    /// Selector involved in the failure, if any
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::ElementNotFound { selector, .. }
            | Self::AssertionTimeout { selector, .. }
            | Self::StaleElement { selector } => Some(selector),
            Self::NavigationError { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Failure classification carried into reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Element never matched
    ElementNotFound,
    /// Navigation failed
    NavigationError,
    /// Environment fixture missing
    FixtureMissing,
    /// Expectation did not hold in time
    AssertionTimeout,
    /// Stale element handle
    StaleElement,
    /// Case exceeded its overall timeout
    CaseTimeout,
    /// Case body panicked
    Panic,
    /// Backend failure
    Session,
}

impl FailureKind {
    /// Stable name used in text output
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ElementNotFound => "ElementNotFound",
            Self::NavigationError => "NavigationError",
            Self::FixtureMissing => "FixtureMissing",
            Self::AssertionTimeout => "AssertionTimeout",
            Self::StaleElement => "StaleElement",
            Self::CaseTimeout => "CaseTimeout",
            Self::Panic => "Panic",
            Self::Session => "SessionError",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_message() {
        let err = ShopError::ElementNotFound {
            selector: "#Email".to_string(),
            state: "visible".to_string(),
            timeout_ms: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("#Email"));
        assert!(msg.contains("visible"));
        assert_eq!(err.kind(), FailureKind::ElementNotFound);
        assert_eq!(err.selector(), Some("#Email"));
    }

    #[test]
    fn test_fixture_missing_names_variable() {
        let err = ShopError::FixtureMissing {
            variable: "TEST_EMAIL".to_string(),
        };
        assert!(err.to_string().contains("TEST_EMAIL"));
        assert_eq!(err.kind(), FailureKind::FixtureMissing);
        assert!(err.selector().is_none());
    }

    #[test]
    fn test_backend_errors_classify_as_session() {
        assert_eq!(ShopError::session("boom").kind(), FailureKind::Session);
        let io = ShopError::from(std::io::Error::other("disk"));
        assert_eq!(io.kind(), FailureKind::Session);
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::AssertionTimeout).unwrap();
        assert_eq!(json, "\"assertion_timeout\"");
        assert_eq!(FailureKind::Session.to_string(), "SessionError");
    }
}
