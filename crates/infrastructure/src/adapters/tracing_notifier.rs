//! Notifier that writes notices to the log.

use nimbus_application::Notifier;
use nimbus_domain::{Notice, NoticeLevel};
use tracing::{info, warn};

/// Shows notices as log lines; used by the command-line front end.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        let timeout_ms = u64::try_from(notice.timeout.as_millis()).unwrap_or(u64::MAX);
        match notice.level {
            NoticeLevel::Negative => {
                warn!(position = ?notice.position, timeout_ms, "{}", notice.message);
            }
            NoticeLevel::Info => info!(position = ?notice.position, timeout_ms, "{}", notice.message),
        }
    }
}
