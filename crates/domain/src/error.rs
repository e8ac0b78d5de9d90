//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// No route is registered under the given name.
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    /// The export kind is not one of the known reports.
    #[error("unknown export kind: {0}")]
    UnknownExport(String),

    /// A payload could not be encoded or decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
