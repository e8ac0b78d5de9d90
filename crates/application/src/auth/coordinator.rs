//! Single-flight access token refresh.
//!
//! The first caller to hit an expired token becomes the leader and makes
//! the one refresh call of the episode. Callers arriving while it is in
//! flight become followers: they park on a oneshot channel and are
//! released front-to-back with the leader's outcome.
//!
//! Known limitation: a follower whose leader never settles (runtime torn
//! down mid-refresh) stays parked. A leader future that is dropped settles
//! its followers with [`SessionError::RefreshAbandoned`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use nimbus_domain::{
    ApiErrorBody, REFRESH_PATH, RefreshRequest, RefreshResponse, RequestSpec, TokenKey,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::error::SessionError;
use super::state::{LogoutReason, SessionState};
use crate::ports::HttpTransport;

type Outcome = Result<String, SessionError>;

/// Refresh endpoint and its time bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Path of the refresh endpoint
    pub endpoint: String,
    /// Upper bound for the refresh call
    pub timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            endpoint: REFRESH_PATH.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

enum Phase {
    Idle,
    Refreshing {
        followers: VecDeque<oneshot::Sender<Outcome>>,
    },
}

/// Ensures at most one refresh call is in flight.
pub struct RefreshCoordinator {
    transport: Arc<dyn HttpTransport>,
    state: Arc<SessionState>,
    config: RefreshConfig,
    phase: Mutex<Phase>,
    calls: AtomicU64,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        state: Arc<SessionState>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            transport,
            state,
            config,
            phase: Mutex::new(Phase::Idle),
            calls: AtomicU64::new(0),
        }
    }

    /// Path of the refresh endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// True while a refresh call is outstanding.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.phase.lock(), Phase::Refreshing { .. })
    }

    /// Number of followers waiting on the current episode.
    #[must_use]
    pub fn pending(&self) -> usize {
        match &*self.phase.lock() {
            Phase::Idle => 0,
            Phase::Refreshing { followers } => followers.len(),
        }
    }

    /// Refresh calls sent to the network since creation.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Obtains a fresh access token, joining the in-flight episode if
    /// there is one.
    ///
    /// On failure the session is logged out before the leader or any
    /// follower sees the error.
    ///
    /// # Errors
    ///
    /// `NoRefreshToken` when nothing is stored, `RefreshRejected` when
    /// the server refuses, `Timeout` when the call exceeds its bound, or
    /// the transport error. `RefreshAbandoned` when the session was ended
    /// or replaced before the new token arrived; the store is left as is.
    pub async fn refresh(&self) -> Result<String, SessionError> {
        // Test-and-set in one critical section; no await while locked.
        let follower = {
            let mut phase = self.phase.lock();
            match &mut *phase {
                Phase::Refreshing { followers } => {
                    let (tx, rx) = oneshot::channel();
                    followers.push_back(tx);
                    debug!(position = followers.len(), "refresh in flight, queueing");
                    Some(rx)
                }
                Phase::Idle => {
                    *phase = Phase::Refreshing {
                        followers: VecDeque::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = follower {
            return rx.await.unwrap_or(Err(SessionError::RefreshAbandoned));
        }

        let mut episode = Episode {
            coordinator: self,
            settled: false,
        };
        let outcome = self.lead().await;

        // Log out before releasing followers so none of them sees a stale session.
        // An abandoned episode belongs to a session that already ended.
        let forced = match &outcome {
            Ok(_) | Err(SessionError::RefreshAbandoned) => None,
            Err(SessionError::NoRefreshToken) => Some(LogoutReason::NoRefreshToken),
            Err(_) => Some(LogoutReason::RefreshFailed),
        };
        if let Some(Err(store_err)) = forced.map(|reason| self.state.end(reason)) {
            error!(error = %store_err, "failed to clear tokens during forced logout");
        }
        episode.settle(&outcome);
        outcome
    }

    async fn lead(&self) -> Outcome {
        let Some(refresh) = self.state.tokens().get(TokenKey::Refresh) else {
            warn!("access token expired and no refresh token is stored");
            return Err(SessionError::NoRefreshToken);
        };

        let body = serde_json::to_value(RefreshRequest {
            refresh: refresh.clone(),
        })
            .map_err(|e| SessionError::RefreshRejected {
                status: None,
                message: e.to_string(),
            })?;
        let request = RequestSpec::post(&self.config.endpoint, body).with_timeout(self.config.timeout);
        let timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);

        self.calls.fetch_add(1, Ordering::Relaxed);
        info!(request_id = %request.id, "refreshing access token");

        let response = tokio::time::timeout(self.config.timeout, self.transport.execute(&request))
            .await
            .map_err(|_| SessionError::Timeout { timeout_ms })??;

        if !response.is_success() {
            let detail = response
                .decode::<ApiErrorBody>()
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| response.text());
            warn!(status = response.status, "refresh token rejected");
            return Err(SessionError::RefreshRejected {
                status: Some(response.status),
                message: detail,
            });
        }

        let RefreshResponse { access } =
            response
                .decode()
                .map_err(|e| SessionError::RefreshRejected {
                    status: Some(response.status),
                    message: e.to_string(),
                })?;

        if !self.state.store_refreshed(&refresh, &access)? {
            info!("session ended during refresh, discarding new access token");
            return Err(SessionError::RefreshAbandoned);
        }
        info!("access token refreshed");
        Ok(access)
    }

    /// Returns to `Idle` and hands back the queued followers.
    fn finish(&self) -> VecDeque<oneshot::Sender<Outcome>> {
        match std::mem::replace(&mut *self.phase.lock(), Phase::Idle) {
            Phase::Idle => VecDeque::new(),
            Phase::Refreshing { followers } => followers,
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("config", &self.config)
            .field("refreshing", &self.is_refreshing())
            .field("refresh_calls", &self.refresh_calls())
            .finish_non_exhaustive()
    }
}

/// One leader's refresh episode; releases followers exactly once.
struct Episode<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl Episode<'_> {
    fn settle(&mut self, outcome: &Outcome) {
        self.settled = true;
        let followers = self.coordinator.finish();
        if !followers.is_empty() {
            debug!(count = followers.len(), ok = outcome.is_ok(), "releasing queued requests");
        }
        for follower in followers {
            // A follower that gave up has dropped its receiver.
            let _ = follower.send(outcome.clone());
        }
    }
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh leader dropped before settling");
            for follower in self.coordinator.finish() {
                let _ = follower.send(Err(SessionError::RefreshAbandoned));
            }
        }
    }
}
