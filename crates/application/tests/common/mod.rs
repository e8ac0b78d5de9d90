//! Stub reporting API shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;

use nimbus_application::{
    AuthenticatedClient, Clock, HttpClientError, HttpTransport, MemoryTokenStore, RefreshConfig,
    SessionState, TokenStore,
};
use nimbus_domain::{PROFILE_PATH, REFRESH_PATH, RequestSpec, ResponseSpec, TokenKey, TokenPair};

/// How the stub answers the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshBehavior {
    /// Issues `access-<n>` and starts accepting it.
    Issue,
    /// Issues a token the API keeps rejecting.
    IssueUnaccepted,
    /// Answers 401 `token_not_valid`.
    Reject,
    /// Never answers.
    Hang,
}

/// In-process stand-in for the reporting API.
pub struct StubApi {
    valid: Mutex<String>,
    refresh: Mutex<RefreshBehavior>,
    refresh_gate: Mutex<Option<Arc<Notify>>>,
    refresh_calls: AtomicUsize,
    profile: Mutex<(u16, Value)>,
    profile_gate: Mutex<Option<Arc<Notify>>>,
    rotation: Mutex<Option<(Arc<MemoryTokenStore>, String)>>,
    log: Mutex<Vec<RequestSpec>>,
}

impl StubApi {
    pub fn accepting(token: &str) -> Arc<Self> {
        Arc::new(Self {
            valid: Mutex::new(token.to_string()),
            refresh: Mutex::new(RefreshBehavior::Issue),
            refresh_gate: Mutex::new(None),
            refresh_calls: AtomicUsize::new(0),
            profile: Mutex::new((
                200,
                json!({"id": 1, "username": "ana", "nombre": "Ana", "apellido": "Ruiz", "is_staff": true}),
            )),
            profile_gate: Mutex::new(None),
            rotation: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn set_refresh(&self, behavior: RefreshBehavior) {
        *self.refresh.lock() = behavior;
    }

    /// Holds refresh answers until the returned gate is notified.
    pub fn gate_refresh(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.refresh_gate.lock() = Some(gate.clone());
        gate
    }

    /// Holds profile answers until the returned gate is notified.
    pub fn gate_profile(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.profile_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn set_profile(&self, status: u16, body: Value) {
        *self.profile.lock() = (status, body);
    }

    /// On the next rejected request, store `token` as if another caller
    /// had just refreshed, and start accepting it.
    pub fn rotate_on_reject(&self, store: Arc<MemoryTokenStore>, token: &str) {
        *self.rotation.lock() = Some((store, token.to_string()));
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RequestSpec> {
        self.log.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RequestSpec> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    async fn answer_refresh(&self, request: &RequestSpec) -> ResponseSpec {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let gate = self.refresh_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let behavior = *self.refresh.lock();
        match behavior {
            RefreshBehavior::Hang => std::future::pending().await,
            RefreshBehavior::Reject => token_not_valid(),
            RefreshBehavior::Issue | RefreshBehavior::IssueUnaccepted => {
                assert!(request.body.as_ref().is_some_and(|b| b["refresh"].is_string()));
                let access = format!("access-{n}");
                if behavior == RefreshBehavior::Issue {
                    *self.valid.lock() = access.clone();
                }
                ResponseSpec::json(200, &json!({ "access": access }))
            }
        }
    }

    async fn answer_profile(&self) -> ResponseSpec {
        let gate = self.profile_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let (status, body) = self.profile.lock().clone();
        ResponseSpec::json(status, &body)
    }

    fn accepts(&self, request: &RequestSpec) -> bool {
        request.bearer() == Some(self.valid.lock().as_str())
    }
}

#[async_trait]
impl HttpTransport for StubApi {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        self.log.lock().push(request.clone());

        if request.path == REFRESH_PATH {
            return Ok(self.answer_refresh(request).await);
        }
        if !self.accepts(request) {
            if let Some((store, token)) = self.rotation.lock().take() {
                store.set(TokenKey::Access, &token).unwrap();
                *self.valid.lock() = token;
            }
            return Ok(token_not_valid());
        }
        if request.path == PROFILE_PATH {
            return Ok(self.answer_profile().await);
        }
        Ok(ResponseSpec::json(200, &json!({ "path": request.path })))
    }
}

pub fn token_not_valid() -> ResponseSpec {
    ResponseSpec::json(
        401,
        &json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
    )
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap()
    }
}

/// A client over `api` whose store starts with `pair`, if any.
pub fn client_with(
    api: &Arc<StubApi>,
    pair: Option<TokenPair>,
) -> (AuthenticatedClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(pair.map_or_else(MemoryTokenStore::new, |p| MemoryTokenStore::with_pair(&p)));
    let state = Arc::new(SessionState::new(store.clone(), Arc::new(FixedClock)));
    let client = AuthenticatedClient::new(api.clone(), state, RefreshConfig::default());
    (client, store)
}

/// Polls `condition` until it holds, letting other tasks run in between.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..5_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
