//! Session error taxonomy

use thiserror::Error;

use crate::ports::{HttpClientError, TokenStoreError};

/// Errors surfaced by the authenticated session.
///
/// `Clone` so a single refresh outcome can be handed to every queued
/// follower.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A refresh was needed but no refresh token is stored.
    #[error("no refresh token available; please log in again")]
    NoRefreshToken,

    /// The server refused the refresh token.
    #[error("session expired: {message}")]
    RefreshRejected {
        /// Status of the refresh response, if one was received
        status: Option<u16>,
        /// Server detail or decoding failure
        message: String,
    },

    /// The request exceeded its time bound.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The bound that was exceeded
        timeout_ms: u64,
    },

    /// The refresh episode ended without a usable token: its leader went
    /// away, or the session ended while the call was in flight.
    #[error("token refresh was abandoned")]
    RefreshAbandoned,

    /// A non-success status where the session needed a success.
    #[error("unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
    },

    /// The profile payload could not be normalized.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Transport failure, passed through untouched.
    #[error(transparent)]
    Http(HttpClientError),

    /// Token persistence failed.
    #[error(transparent)]
    Storage(#[from] TokenStoreError),
}

impl SessionError {
    /// Returns true for failures that end the session (forced logout).
    #[must_use]
    pub const fn is_session_failure(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::RefreshRejected { .. })
    }
}

impl From<HttpClientError> for SessionError {
    fn from(error: HttpClientError) -> Self {
        match error {
            HttpClientError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            other => Self::Http(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transport_timeout_becomes_session_timeout() {
        let error = SessionError::from(HttpClientError::Timeout { timeout_ms: 500 });
        assert_eq!(error, SessionError::Timeout { timeout_ms: 500 });
    }

    #[test]
    fn test_other_transport_errors_pass_through() {
        let error = SessionError::from(HttpClientError::ConnectionFailed("reset".into()));
        assert_eq!(
            error,
            SessionError::Http(HttpClientError::ConnectionFailed("reset".into()))
        );
        assert_eq!(error.to_string(), "connection failed: reset");
    }

    #[test]
    fn test_session_failures() {
        assert!(SessionError::NoRefreshToken.is_session_failure());
        assert!(
            SessionError::RefreshRejected {
                status: Some(401),
                message: String::new()
            }
            .is_session_failure()
        );
        assert!(!SessionError::Timeout { timeout_ms: 1 }.is_session_failure());
    }
}
