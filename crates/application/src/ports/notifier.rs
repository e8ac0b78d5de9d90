//! User notification port

use nimbus_domain::Notice;

/// Sink for transient user-visible notices.
pub trait Notifier: Send + Sync {
    /// Shows a notice.
    fn notify(&self, notice: &Notice);
}
