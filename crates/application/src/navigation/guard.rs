//! Pre-navigation guard.

use std::sync::Arc;

use async_trait::async_trait;
use nimbus_domain::{NavigationDecision, Notice, Route, RouteName};
use tracing::debug;

use crate::ports::Notifier;

/// What the guard needs to know about the session.
#[async_trait]
pub trait SessionView: Send + Sync {
    /// Whether a session is active.
    fn is_logged_in(&self) -> bool;

    /// Whether the user is an administrator. May fetch the profile.
    async fn is_admin(&self) -> bool;
}

/// Decides whether a navigation may proceed.
pub struct NavigationGuard {
    session: Arc<dyn SessionView>,
    notifier: Arc<dyn Notifier>,
}

impl NavigationGuard {
    /// Creates a guard.
    #[must_use]
    pub fn new(session: Arc<dyn SessionView>, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, notifier }
    }

    /// Checks a navigation from `from` to `to`.
    ///
    /// Unauthenticated users are sent to login for protected routes.
    /// Non-admins are sent to the index for admin routes, with one
    /// access-denied notice. Everything else proceeds.
    pub async fn before_each(&self, to: &Route, from: Option<&Route>) -> NavigationDecision {
        let from = from.map(|route| route.name);

        if to.meta.requires_auth && !self.session.is_logged_in() {
            debug!(to = %to.name, ?from, "not logged in, redirecting to login");
            return NavigationDecision::redirect(RouteName::Login);
        }

        if to.meta.requires_admin && !self.session.is_admin().await {
            debug!(to = %to.name, ?from, "admin route denied");
            self.notifier.notify(&Notice::access_denied());
            return NavigationDecision::redirect(RouteName::Index);
        }

        NavigationDecision::Proceed
    }
}

impl std::fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationGuard").finish_non_exhaustive()
    }
}
