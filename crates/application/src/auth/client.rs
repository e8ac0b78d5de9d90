//! HTTP client that carries the session's bearer token.

use std::sync::Arc;

use nimbus_domain::{RequestSpec, ResponseSpec, TokenKey};
use tracing::debug;

use super::coordinator::{RefreshConfig, RefreshCoordinator};
use super::error::SessionError;
use super::state::SessionState;
use crate::ports::HttpTransport;

/// Wraps a transport with bearer attachment and transparent refresh.
///
/// Cheap to clone; clones share the coordinator and state.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    state: Arc<SessionState>,
    coordinator: Arc<RefreshCoordinator>,
}

impl AuthenticatedClient {
    /// Creates a client and its refresh coordinator.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        state: Arc<SessionState>,
        config: RefreshConfig,
    ) -> Self {
        let coordinator = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            state.clone(),
            config,
        ));
        Self {
            transport,
            state,
            coordinator,
        }
    }

    /// The session this client authenticates as.
    #[must_use]
    pub const fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// The refresh coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Sends a request, recovering once from an expired access token.
    ///
    /// Any response that is not a `token_not_valid` 401 is returned as
    /// is, whatever its status. A qualifying 401 triggers the refresh flow
    /// unless the request is already a replay or targets the refresh
    /// endpoint; the replay's response is returned in its place.
    ///
    /// # Errors
    ///
    /// Transport failures, or the refresh failure when recovery was
    /// needed and did not succeed. `NoRefreshToken` without a new logout
    /// when the session had already ended.
    pub async fn send(&self, request: RequestSpec) -> Result<ResponseSpec, SessionError> {
        let request = self.authorize(request);
        let response = self.transport.execute(&request).await?;

        if !self.should_refresh(&request, &response) {
            return Ok(response);
        }

        match self.state.tokens().get(TokenKey::Access) {
            // Another caller may have refreshed while this request was in flight.
            Some(current) if Some(current.as_str()) != request.bearer() => {
                debug!(request_id = %request.id, "access token rotated in flight, replaying");
                return self.replay(request, &current).await;
            }
            // The session already ended; logging out again would repeat the event.
            None if !self.state.is_logged_in() => {
                debug!(request_id = %request.id, "session already ended, not refreshing");
                return Err(SessionError::NoRefreshToken);
            }
            _ => {}
        }

        let access = self.coordinator.refresh().await?;
        self.replay(request, &access).await
    }

    fn authorize(&self, mut request: RequestSpec) -> RequestSpec {
        if let Some(token) = self.state.tokens().get(TokenKey::Access) {
            request.set_bearer(&token);
        }
        request
    }

    fn should_refresh(&self, request: &RequestSpec, response: &ResponseSpec) -> bool {
        response.is_token_not_valid()
            && !request.retry
            && !request.targets(self.coordinator.endpoint())
    }

    async fn replay(&self, request: RequestSpec, token: &str) -> Result<ResponseSpec, SessionError> {
        let mut request = request.into_retry();
        request.set_bearer(token);
        debug!(request_id = %request.id, method = %request.method, path = %request.path, "replaying request");
        Ok(self.transport.execute(&request).await?)
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::ports::{Clock, HttpClientError};
    use crate::services::testing::ScriptedTransport;
    use chrono::{DateTime, Utc};
    use nimbus_domain::TokenPair;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct EpochClock;

    impl Clock for EpochClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::UNIX_EPOCH
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> AuthenticatedClient {
        let store = Arc::new(MemoryTokenStore::with_pair(&TokenPair::new("a1", "r1")));
        let state = Arc::new(SessionState::new(store, Arc::new(EpochClock)));
        AuthenticatedClient::new(transport, state, RefreshConfig::default())
    }

    #[tokio::test]
    async fn test_non_qualifying_responses_pass_through() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(500, &json!({"detail": "boom"}))));
        transport.push(Ok(ResponseSpec::json(401, &json!({"detail": "no credentials"}))));
        transport.push(Ok(ResponseSpec::json(403, &json!({"code": "token_not_valid"}))));
        let client = client(transport.clone());

        for expected in [500, 401, 403] {
            let response = client.send(RequestSpec::get("/registros/")).await.unwrap();
            assert_eq!(response.status, expected);
        }
        assert_eq!(transport.sent().len(), 3);
        assert_eq!(client.coordinator().refresh_calls(), 0);
        assert!(client.state().tokens().get(TokenKey::Refresh).is_some());
    }

    #[tokio::test]
    async fn test_transport_timeout_becomes_session_timeout() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Err(HttpClientError::Timeout { timeout_ms: 30_000 }));
        transport.push(Err(HttpClientError::ConnectionFailed("reset".to_string())));
        let client = client(transport);

        let timeout = client.send(RequestSpec::get("/a/")).await.unwrap_err();
        let failed = client.send(RequestSpec::get("/b/")).await.unwrap_err();

        assert_eq!(timeout, SessionError::Timeout { timeout_ms: 30_000 });
        assert_eq!(
            failed,
            SessionError::Http(HttpClientError::ConnectionFailed("reset".to_string()))
        );
    }

    #[tokio::test]
    async fn test_explicit_authorization_header_is_replaced() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(200, &json!({}))));
        let client = client(transport.clone());

        client
            .send(RequestSpec::get("/a/").with_header(nimbus_domain::AUTHORIZATION, "Bearer old"))
            .await
            .unwrap();

        assert_eq!(transport.sent()[0].bearer(), Some("a1"));
    }
}
