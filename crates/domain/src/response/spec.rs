//! Received response description

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{ApiErrorBody, TOKEN_NOT_VALID};
use crate::error::{DomainError, DomainResult};

/// HTTP response as seen by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: BTreeMap<String, String>,
    /// Raw response body
    pub body: Vec<u8>,
    /// Response time
    pub duration: Duration,
}

impl ResponseSpec {
    /// Creates a response.
    #[must_use]
    pub const fn new(
        status: u16,
        headers: BTreeMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            duration,
        }
    }

    /// Creates a response carrying a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::new(status, headers, body.to_string().into_bytes(), Duration::ZERO)
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true if the status code indicates a client error (4xx).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Decodes the body as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if the body is not valid JSON
    /// for `T`. An empty body decodes as JSON `null`.
    pub fn decode<T: DeserializeOwned>(&self) -> DomainResult<T> {
        let bytes: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
        serde_json::from_slice(bytes).map_err(|e| DomainError::InvalidPayload(e.to_string()))
    }

    /// Returns the body as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the `code` field of an API error body, if present.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        serde_json::from_slice::<ApiErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.code)
    }

    /// Returns true for a 401 whose body carries the `token_not_valid` code.
    #[must_use]
    pub fn is_token_not_valid(&self) -> bool {
        self.status == 401 && self.error_code().as_deref() == Some(TOKEN_NOT_VALID)
    }
}
