//! Observable session state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nimbus_domain::{RouteName, TokenKey, TokenPair, UserProfile};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::ports::{Clock, TokenStore, TokenStoreError};

const EVENT_CAPACITY: usize = 32;

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// True once tokens were written (or restored) and until logout.
    pub is_logged_in: bool,
    /// Normalized profile, once loaded.
    pub user: Option<UserProfile>,
    /// When the session was established in this process.
    pub logged_in_at: Option<DateTime<Utc>>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// A refresh was needed but no refresh token was stored.
    NoRefreshToken,
    /// The refresh call failed or was rejected.
    RefreshFailed,
}

impl LogoutReason {
    /// Route the front end must navigate to, for forced logouts.
    #[must_use]
    pub const fn redirect(self) -> Option<RouteName> {
        match self {
            Self::UserRequested => None,
            Self::NoRefreshToken | Self::RefreshFailed => Some(RouteName::Login),
        }
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Tokens were written and the session is active.
    LoggedIn,
    /// The profile was fetched and normalized.
    ProfileLoaded(UserProfile),
    /// Tokens were cleared.
    LoggedOut {
        /// Why the session ended
        reason: LogoutReason,
    },
}

/// Owner of the `is_logged_in`/`user` state and of the token store.
///
/// State changes are published on a `watch` channel; lifecycle events on
/// a `broadcast` channel.
pub struct SessionState {
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    snapshot: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
    // Serializes login, logout and refreshed-token writes.
    writes: Mutex<()>,
}

impl SessionState {
    /// Creates a logged-out state over the given store.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tokens,
            clock,
            snapshot,
            events,
            writes: Mutex::new(()),
        }
    }

    /// The token store backing this session.
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.snapshot.borrow().is_logged_in
    }

    /// The loaded profile, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.snapshot.borrow().user.clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Writes the token pair and marks the session active.
    pub(crate) fn begin(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        {
            let _writes = self.writes.lock();
            self.tokens.store_pair(pair)?;
        }
        let now = self.clock.now();
        self.snapshot.send_modify(|state| {
            state.is_logged_in = true;
            state.user = None;
            state.logged_in_at = Some(now);
        });
        info!("session started");
        self.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Marks the session active if an access token is already stored.
    /// The stored token is trusted until a request rejects it.
    pub(crate) fn restore(&self) -> bool {
        if self.tokens.get(TokenKey::Access).is_none() {
            debug!("no stored access token, starting logged out");
            return false;
        }
        let now = self.clock.now();
        self.snapshot.send_modify(|state| {
            state.is_logged_in = true;
            state.logged_in_at = Some(now);
        });
        info!("restored session from stored access token");
        true
    }

    /// Stores the profile. Ignored once the session has ended, so a late
    /// fetch cannot resurrect a logged-out user.
    pub(crate) fn set_user(&self, profile: UserProfile) {
        let applied = self.snapshot.send_if_modified(|state| {
            if state.is_logged_in {
                state.user = Some(profile.clone());
                true
            } else {
                false
            }
        });
        if applied {
            debug!(admin = profile.is_admin(), "profile loaded");
            self.emit(SessionEvent::ProfileLoaded(profile));
        } else {
            debug!("discarding profile for ended session");
        }
    }

    /// Stores an access token obtained with `sent_refresh`.
    ///
    /// Returns false and leaves the store untouched when the refresh token
    /// is no longer the stored one, i.e. the session was ended or replaced
    /// while the refresh call was in flight.
    pub(crate) fn store_refreshed(
        &self,
        sent_refresh: &str,
        access: &str,
    ) -> Result<bool, TokenStoreError> {
        let _writes = self.writes.lock();
        if self.tokens.get(TokenKey::Refresh).as_deref() != Some(sent_refresh) {
            debug!("session changed during refresh, dropping new access token");
            return Ok(false);
        }
        self.tokens.set(TokenKey::Access, access)?;
        Ok(true)
    }

    /// Resets to logged out without touching the store.
    pub(crate) fn mark_anonymous(&self) {
        self.snapshot.send_if_modified(|state| {
            let changed = state.is_logged_in || state.user.is_some();
            *state = SessionSnapshot::default();
            changed
        });
    }

    /// Clears both tokens and resets the state.
    ///
    /// The state is reset even when the store fails; the failure is
    /// returned afterwards.
    pub(crate) fn end(&self, reason: LogoutReason) -> Result<(), TokenStoreError> {
        let cleared = {
            let _writes = self.writes.lock();
            self.tokens.clear()
        };
        self.snapshot.send_replace(SessionSnapshot::default());
        match reason {
            LogoutReason::UserRequested => info!("session ended by user"),
            forced => warn!(reason = ?forced, "session ended, redirecting to login"),
        }
        self.emit(SessionEvent::LoggedOut { reason });
        cleared
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
        }
    }

    fn state_with(store: MemoryTokenStore) -> (SessionState, Arc<MemoryTokenStore>) {
        let store = Arc::new(store);
        let state = SessionState::new(store.clone(), Arc::new(FixedClock));
        (state, store)
    }

    fn profile() -> UserProfile {
        UserProfile::try_from(json!({"nombre": "Ana", "apellido": "Ruiz"})).unwrap()
    }

    #[test]
    fn test_begin_writes_tokens_and_logs_in() {
        let (state, store) = state_with(MemoryTokenStore::new());
        let mut events = state.events();

        state.begin(&TokenPair::new("a", "r")).unwrap();

        assert!(state.is_logged_in());
        assert_eq!(store.get(TokenKey::Access).as_deref(), Some("a"));
        assert_eq!(store.get(TokenKey::Refresh).as_deref(), Some("r"));
        assert_eq!(state.snapshot().logged_in_at, Some(FixedClock.now()));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);
    }

    #[test]
    fn test_restore_requires_access_token() {
        let (state, _) = state_with(MemoryTokenStore::new());
        assert!(!state.restore());
        assert!(!state.is_logged_in());

        let (state, _) = state_with(MemoryTokenStore::with_pair(&TokenPair::new("a", "r")));
        assert!(state.restore());
        assert!(state.is_logged_in());
        assert!(state.user().is_none());
    }

    #[test]
    fn test_end_clears_everything() {
        let (state, store) = state_with(MemoryTokenStore::new());
        state.begin(&TokenPair::new("a", "r")).unwrap();
        state.set_user(profile());
        let mut events = state.events();

        state.end(LogoutReason::RefreshFailed).unwrap();

        assert_eq!(state.snapshot(), SessionSnapshot::default());
        assert!(store.is_empty());
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::LoggedOut {
                reason: LogoutReason::RefreshFailed
            }
        );
    }

    #[test]
    fn test_late_profile_is_discarded_after_logout() {
        let (state, _) = state_with(MemoryTokenStore::new());
        state.begin(&TokenPair::new("a", "r")).unwrap();
        state.end(LogoutReason::UserRequested).unwrap();

        state.set_user(profile());

        assert!(state.user().is_none());
        assert!(!state.is_logged_in());
    }

    #[test]
    fn test_refreshed_token_is_dropped_once_session_changed() {
        let (state, store) = state_with(MemoryTokenStore::new());
        state.begin(&TokenPair::new("a", "r")).unwrap();

        assert!(state.store_refreshed("r", "a2").unwrap());
        assert_eq!(store.get(TokenKey::Access).as_deref(), Some("a2"));

        state.begin(&TokenPair::new("b", "r2")).unwrap();
        assert!(!state.store_refreshed("r", "a3").unwrap());
        assert_eq!(store.get(TokenKey::Access).as_deref(), Some("b"));

        state.end(LogoutReason::UserRequested).unwrap();
        assert!(!state.store_refreshed("r2", "b2").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_watch_subscribers_see_changes() {
        let (state, _) = state_with(MemoryTokenStore::new());
        let mut rx = state.subscribe();

        state.begin(&TokenPair::new("a", "r")).unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_logged_in);
    }

    #[test]
    fn test_forced_logouts_redirect_to_login() {
        assert_eq!(LogoutReason::UserRequested.redirect(), None);
        assert_eq!(LogoutReason::NoRefreshToken.redirect(), Some(RouteName::Login));
        assert_eq!(LogoutReason::RefreshFailed.redirect(), Some(RouteName::Login));
    }
}
