//! HTTP transport port

use async_trait::async_trait;
use nimbus_domain::{RequestSpec, ResponseSpec};
use thiserror::Error;

/// Transport-level failures. Any HTTP status, including 4xx and 5xx,
/// is a successful exchange and comes back as a `ResponseSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    /// The request exceeded its time bound.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The bound that was exceeded
        timeout_ms: u64,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true for timeouts.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Port for executing HTTP requests.
///
/// Implementations resolve relative paths against their base URL and
/// apply `RequestSpec::timeout` or their own default bound. They must not
/// add credentials; the session core does that.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received: network failure,
    /// timeout, or a request that could not be built.
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError>;
}
