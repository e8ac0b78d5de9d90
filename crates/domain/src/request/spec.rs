//! Re-issuable request description

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::HttpMethod;

/// Name of the header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

const BEARER_PREFIX: &str = "Bearer ";

/// How the caller wants the response body interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// JSON document (the API default).
    #[default]
    Json,
    /// Raw bytes, used for generated documents.
    Bytes,
}

/// A request against the reporting API, re-issuable as-is.
///
/// `path` is either relative to the transport's base URL
/// (`/registros/`) or an absolute `http(s)` URL for static files.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Unique identifier, used to correlate log lines.
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Relative API path or absolute URL
    pub path: String,
    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// JSON body, if any
    pub body: Option<Value>,
    /// Upper bound overriding the transport default
    pub timeout: Option<Duration>,
    /// Expected response shape
    pub response_type: ResponseType,
    /// Set once the request has been replayed after a token refresh.
    pub retry: bool,
}

impl RequestSpec {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
            response_type: ResponseType::default(),
            retry: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    /// Creates a PATCH request with a JSON body.
    #[must_use]
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(body)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a single query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends every scalar entry of a JSON object as a query parameter.
    ///
    /// Nulls are skipped, strings are sent verbatim and other scalars use
    /// their JSON rendering. Non-object values add nothing.
    #[must_use]
    pub fn with_params(mut self, params: &Value) -> Self {
        if let Value::Object(map) = params {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(s) => self.query.push((key.clone(), s.clone())),
                    other => self.query.push((key.clone(), other.to_string())),
                }
            }
        }
        self
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets an explicit timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the expected response type.
    #[must_use]
    pub const fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Attaches `token` as the bearer credential.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .insert(AUTHORIZATION.to_string(), format!("{BEARER_PREFIX}{token}"));
    }

    /// Returns the bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }

    /// Returns a copy flagged as a post-refresh replay.
    #[must_use]
    pub fn into_retry(mut self) -> Self {
        self.retry = true;
        self
    }

    /// Returns true if the request targets the given endpoint.
    #[must_use]
    pub fn targets(&self, endpoint: &str) -> bool {
        self.path.contains(endpoint)
    }

    /// Returns true if `path` is an absolute `http(s)` URL.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        Url::parse(&self.path).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}
