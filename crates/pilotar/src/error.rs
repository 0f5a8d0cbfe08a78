//! Result and error types for the harness.
//!
//! Failures split into two families: *transient* kinds that the condition
//! poller swallows and retries (element not yet attached, handle invalidated
//! by a re-render), and *fatal* kinds that propagate immediately and fail the
//! current scenario. The split is a closed set of variants so wait policies
//! can express "retryable vs fatal" as a plain pattern match.

use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Classification of a failure, used by wait policies to decide between
/// retrying and propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Locator currently matches nothing (expected to self-resolve)
    NotFound,
    /// Element handle invalidated by a DOM mutation since resolution
    Stale,
    /// A condition never became ready within its wait policy
    Timeout,
    /// A script-level manipulation call itself failed
    Script,
    /// A navigation request failed outright
    Navigation,
    /// Browser session launch, connection, or shutdown failed
    Session,
    /// A fixture asset could not be resolved
    Fixture,
    /// Underlying I/O failure
    Io,
    /// JSON (de)serialization failure at the session boundary
    Json,
}

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No element currently matches the locator
    #[error("no element matches {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Element handle no longer refers to a live DOM node
    #[error("element handle {handle} is stale (DOM mutated since resolution)")]
    StaleElement {
        /// Handle id
        handle: String,
    },

    /// Condition never reached ready within the wait policy
    #[error("timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// Configured timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waiting_for: String,
    },

    /// Direct script invocation failed
    #[error("script execution failed: {message}")]
    ScriptFailure {
        /// Error message
        message: String,
    },

    /// Navigation request failed
    #[error("navigation to {url} failed: {message}")]
    NavigationFailure {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser session could not be launched, reached, or closed
    #[error("browser session error: {message}")]
    SessionFailure {
        /// Error message
        message: String,
    },

    /// Fixture asset missing from the fixtures directory
    #[error("fixture asset not found: {path}")]
    FixtureMissing {
        /// Path that was probed
        path: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Classify this error for retry decisions.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ElementNotFound { .. } => ErrorKind::NotFound,
            Self::StaleElement { .. } => ErrorKind::Stale,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ScriptFailure { .. } => ErrorKind::Script,
            Self::NavigationFailure { .. } => ErrorKind::Navigation,
            Self::SessionFailure { .. } => ErrorKind::Session,
            Self::FixtureMissing { .. } => ErrorKind::Fixture,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
        }
    }

    /// Whether this error is expected to self-resolve with time.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::Stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        let not_found = HarnessError::ElementNotFound {
            locator: "id=Name".to_string(),
        };
        let stale = HarnessError::StaleElement {
            handle: "7".to_string(),
        };
        assert!(not_found.is_transient());
        assert!(stale.is_transient());
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(stale.kind(), ErrorKind::Stale);
    }

    #[test]
    fn test_fatal_kinds() {
        let timeout = HarnessError::Timeout {
            ms: 10_000,
            waiting_for: "row".to_string(),
        };
        let script = HarnessError::ScriptFailure {
            message: "boom".to_string(),
        };
        let nav = HarnessError::NavigationFailure {
            url: "http://localhost:5138".to_string(),
            message: "refused".to_string(),
        };
        assert!(!timeout.is_transient());
        assert!(!script.is_transient());
        assert!(!nav.is_transient());
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert_eq!(script.kind(), ErrorKind::Script);
        assert_eq!(nav.kind(), ErrorKind::Navigation);
    }

    #[test]
    fn test_display_messages() {
        let err = HarnessError::Timeout {
            ms: 1500,
            waiting_for: "document readiness".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("1500ms"));
        assert!(rendered.contains("document readiness"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = HarnessError::from(io);
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
