//! Session lifecycle: login, logout, restore and profile loading.

use std::sync::Arc;

use async_trait::async_trait;
use nimbus_domain::{PROFILE_PATH, RequestSpec, TokenKey, TokenPair, UserProfile};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::client::AuthenticatedClient;
use super::error::SessionError;
use super::state::{LogoutReason, SessionState};
use crate::navigation::SessionView;

/// Owns the session's lifecycle operations.
///
/// Constructed once at startup and shared; there is no global instance.
pub struct SessionManager {
    state: Arc<SessionState>,
    client: AuthenticatedClient,
    profile_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Creates a manager over an existing client, without restoring.
    #[must_use]
    pub fn new(client: AuthenticatedClient) -> Self {
        Self {
            state: client.state().clone(),
            client,
            profile_task: Mutex::new(None),
        }
    }

    /// Creates a manager and restores a stored session.
    ///
    /// When an access token is stored the session is marked logged in
    /// immediately and the profile is fetched in the background.
    #[must_use]
    pub fn init(client: AuthenticatedClient) -> Arc<Self> {
        let manager = Arc::new(Self::new(client));
        if manager.state.restore() {
            manager.spawn_profile_load();
        }
        manager
    }

    /// The observable session state.
    #[must_use]
    pub const fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// The authenticated client bound to this session.
    #[must_use]
    pub const fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Stores the token pair and marks the session logged in.
    ///
    /// `is_logged_in` is true when this returns. A supplied profile is
    /// normalized and stored directly; otherwise it is fetched in the
    /// background and a fetch failure leaves the session logged in.
    ///
    /// # Errors
    ///
    /// `Storage` if the tokens could not be written, `InvalidProfile` if
    /// the supplied profile is not a JSON object. A rejected profile
    /// leaves the store and state untouched.
    pub fn login(&self, pair: &TokenPair, profile: Option<Value>) -> Result<(), SessionError> {
        let profile = profile
            .map(UserProfile::try_from)
            .transpose()
            .map_err(|e| SessionError::InvalidProfile(e.to_string()))?;

        self.cancel_profile_load();
        self.state.begin(pair)?;
        match profile {
            Some(profile) => self.state.set_user(profile),
            None => self.spawn_profile_load(),
        }
        Ok(())
    }

    /// Clears both tokens and resets the state.
    ///
    /// # Errors
    ///
    /// `Storage` if the store could not be cleared. The in-memory state
    /// is reset regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.cancel_profile_load();
        self.state.end(LogoutReason::UserRequested)?;
        Ok(())
    }

    /// Fetches the current user's profile and stores it normalized.
    ///
    /// Without an access token the session is reset to anonymous and
    /// `None` is returned without a network call.
    ///
    /// # Errors
    ///
    /// Transport and refresh failures, `UnexpectedStatus` for non-2xx
    /// answers and `InvalidProfile` for malformed bodies. Only a failed
    /// refresh ends the session; the others leave `is_logged_in` as is.
    pub async fn load_profile(&self) -> Result<Option<UserProfile>, SessionError> {
        fetch_profile(&self.client).await
    }

    /// Whether the current user has administrative rights.
    ///
    /// Loads the profile first when none is present. Any failure counts
    /// as not admin.
    pub async fn is_admin(&self) -> bool {
        if let Some(user) = self.state.user() {
            return user.is_admin();
        }
        match self.load_profile().await {
            Ok(Some(user)) => user.is_admin(),
            Ok(None) => false,
            Err(err) => {
                warn!(error = %err, "could not load profile for admin check");
                false
            }
        }
    }

    /// Aborts any background profile fetch.
    pub fn shutdown(&self) {
        self.cancel_profile_load();
    }

    fn spawn_profile_load(&self) {
        let Ok(runtime) = Handle::try_current() else {
            debug!("no async runtime, profile will load on demand");
            return;
        };
        let client = self.client.clone();
        let task = runtime.spawn(async move {
            if let Err(err) = fetch_profile(&client).await {
                warn!(error = %err, "background profile load failed");
            }
        });
        if let Some(previous) = self.profile_task.lock().replace(task) {
            previous.abort();
        }
    }

    fn cancel_profile_load(&self) {
        if let Some(task) = self.profile_task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.cancel_profile_load();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

async fn fetch_profile(client: &AuthenticatedClient) -> Result<Option<UserProfile>, SessionError> {
    let state = client.state();
    if state.tokens().get(TokenKey::Access).is_none() {
        debug!("no access token, treating session as anonymous");
        state.mark_anonymous();
        return Ok(None);
    }

    let response = client.send(RequestSpec::get(PROFILE_PATH)).await?;
    if !response.is_success() {
        return Err(SessionError::UnexpectedStatus {
            status: response.status,
        });
    }
    let profile = response
        .decode::<Value>()
        .and_then(UserProfile::try_from)
        .map_err(|e| SessionError::InvalidProfile(e.to_string()))?;

    state.set_user(profile.clone());
    Ok(Some(profile))
}

#[async_trait]
impl SessionView for SessionManager {
    fn is_logged_in(&self) -> bool {
        self.state.is_logged_in()
    }

    async fn is_admin(&self) -> bool {
        Self::is_admin(self).await
    }
}
