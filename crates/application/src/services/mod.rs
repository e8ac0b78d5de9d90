//! Services over the reporting API.
//!
//! Thin wrappers that build requests, send them through the
//! authenticated client and turn non-success answers into errors.

mod catalog;
mod export;
mod resource;

pub use catalog::Catalog;
pub use export::{DEFAULT_GENERATION_TIMEOUT, DownloadedFile, ExportService};
pub use resource::ResourceService;

use nimbus_domain::ResponseSpec;
use serde_json::Value;

use crate::error::{ApplicationError, ApplicationResult};

/// Decodes a successful JSON response; anything else is a status error.
pub(crate) fn json_body(response: &ResponseSpec) -> ApplicationResult<Value> {
    ensure_success(response)?;
    Ok(response.decode()?)
}

pub(crate) fn ensure_success(response: &ResponseSpec) -> ApplicationResult<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ApplicationError::Status {
            status: response.status,
            body: response.text(),
        })
    }
}
