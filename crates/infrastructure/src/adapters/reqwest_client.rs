//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. Relative request paths
//! are resolved against the API base URL; absolute URLs (generated files)
//! are used as they are.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nimbus_application::{HttpClientError, HttpTransport};
use nimbus_domain::{HttpMethod, RequestSpec, ResponseSpec};
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for the API at `base_url`.
    ///
    /// `default_timeout` bounds requests that carry no timeout of their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be
    /// created.
    pub fn new(base_url: &str, default_timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("nimbus/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;
        Ok(Self::with_client(client, Self::parse_base(base_url)?, default_timeout))
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, default_timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            default_timeout,
        }
    }

    /// The API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse_base(base_url: &str) -> Result<Url, HttpClientError> {
        Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {base_url}")))
    }

    /// Resolves the request path and appends its query parameters.
    fn resolve(&self, request: &RequestSpec) -> Result<Url, HttpClientError> {
        let raw = if request.is_absolute() {
            request.path.clone()
        } else {
            // Url::join would drop the base path segment (`/api_report`).
            format!(
                "{}/{}",
                self.base_url.as_str().trim_end_matches('/'),
                request.path.trim_start_matches('/')
            )
        };
        let mut url =
            Url::parse(&raw).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {raw}")))?;

        if !request.query.is_empty() {
            let encoded = serde_urlencoded::to_string(&request.query)
                .map_err(|e| HttpClientError::InvalidUrl(e.to_string()))?;
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            if message.to_lowercase().contains("refused") {
                let url = error.url();
                return HttpClientError::ConnectionRefused {
                    host: url
                        .and_then(Url::host_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    port: url.and_then(Url::port_or_known_default).unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_builder() {
            return HttpClientError::InvalidBody(error.to_string());
        }

        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        let url = self.resolve(request)?;
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(request_id = %request.id, method = %request.method, path = %request.path, "sending request");
        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?
            .to_vec();
        let duration = start.elapsed();

        debug!(request_id = %request.id, status, elapsed = ?duration, "response received");
        Ok(ResponseSpec::new(status, headers, body, duration))
    }
}
