//! Clock port

use chrono::{DateTime, Utc};

/// Source of wall-clock time for session timestamps.
///
/// Injected so tests can pin `logged_in_at` to a known instant.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
