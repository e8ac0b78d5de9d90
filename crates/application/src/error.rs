//! Application error types

use nimbus_domain::{DomainError, ExportKind};
use thiserror::Error;

use crate::auth::SessionError;
use crate::ports::HttpClientError;

/// Message shown when document generation exceeds its time bound.
pub const GENERATION_TIMEOUT_MESSAGE: &str = "Excel generation is taking longer than expected. \
     Please try again or contact your administrator.";

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The authenticated session failed the request.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A request outside the session (static file download) failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The export description did not contain a file URL.
    #[error("no file URL found for the {0} export")]
    MissingExportFile(ExportKind),

    /// Document generation exceeded its time bound.
    #[error("{GENERATION_TIMEOUT_MESSAGE}")]
    GenerationTimeout {
        /// The bound that was exceeded, in milliseconds
        timeout_ms: u64,
    },
}

impl ApplicationError {
    /// Returns true if the error is a timeout of any kind.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::GenerationTimeout { .. }
                | Self::Session(SessionError::Timeout { .. })
                | Self::Http(HttpClientError::Timeout { .. })
        )
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
