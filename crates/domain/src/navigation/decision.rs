//! Outcome of a navigation guard check

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RouteName;

/// What the router should do with a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NavigationDecision {
    /// Continue to the requested route.
    Proceed,
    /// Go somewhere else instead.
    Redirect {
        /// Destination route
        to: RouteName,
    },
}

impl NavigationDecision {
    /// Redirect to the given route.
    #[must_use]
    pub const fn redirect(to: RouteName) -> Self {
        Self::Redirect { to }
    }

    /// Returns true if navigation may continue.
    #[must_use]
    pub const fn is_proceed(self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational
    Info,
    /// Something was refused or failed
    Negative,
}

/// Where a notice is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticePosition {
    /// Top of the screen
    #[default]
    Top,
    /// Bottom of the screen
    Bottom,
}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Message text
    pub message: String,
    /// Placement
    pub position: NoticePosition,
    /// How long the notice stays visible
    pub timeout: Duration,
}

impl Notice {
    /// The notice shown when an administrator-only route is refused.
    #[must_use]
    pub fn access_denied() -> Self {
        Self {
            level: NoticeLevel::Negative,
            message: "You do not have permission to access this section".to_string(),
            position: NoticePosition::Top,
            timeout: Duration::from_secs(3),
        }
    }
}
