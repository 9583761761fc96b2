//! Error kinds surfaced by the resolution pipeline.

use thiserror::Error;

/// Errors produced while resolving catalogue entries into releases.
///
/// Recoverable kinds are swallowed inside provider chains and per-entry
/// loops; only [`FinderError::InvalidArgument`] always reaches the caller.
#[derive(Debug, Error)]
pub enum FinderError {
    /// Connectivity failure or a non-success HTTP status
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The outbound call exceeded its time budget
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// JSON or HTML missing the expected keys/structure
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Caller broke a precondition
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Semantic absence (no mapping, no episode, no seeded release)
    #[error("not found: {0}")]
    NotFound(String),
}

impl FinderError {
    /// Build a network error for `url`
    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Build a malformed-payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Whether a pipeline stage may skip past this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FinderError::InvalidArgument(_))
    }

    /// Short machine-friendly name of the kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FinderError::Network { .. } => "network",
            FinderError::Timeout { .. } => "timeout",
            FinderError::MalformedPayload(_) => "malformed_payload",
            FinderError::InvalidArgument(_) => "invalid_argument",
            FinderError::NotFound(_) => "not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_argument_is_fatal() {
        assert!(FinderError::network("http://x", "refused").is_recoverable());
        assert!(FinderError::Timeout { url: "http://x".into() }.is_recoverable());
        assert!(FinderError::malformed("no title").is_recoverable());
        assert!(FinderError::NotFound("episode 3".into()).is_recoverable());
        assert!(!FinderError::InvalidArgument("both ids".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = FinderError::network("https://feed.example/json", "status 502");
        assert_eq!(
            err.to_string(),
            "request to https://feed.example/json failed: status 502"
        );
        assert_eq!(err.kind(), "network");
    }
}
