//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nimbus_application::RefreshConfig;
use nimbus_domain::{Branding, REFRESH_PATH};
use serde::{Deserialize, Serialize};

use crate::persistence::FileTokenStore;
use crate::serialization::{SerializationError, from_json_bytes};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api_report";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid configuration.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Connection settings for the reporting API.
///
/// Every field has a default, so a configuration file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL; relative request paths are appended to it
    pub base_url: String,
    /// Default bound for API requests, in seconds
    pub request_timeout_secs: u64,
    /// Bound for the token refresh call, in seconds
    pub refresh_timeout_secs: u64,
    /// Bound for spreadsheet generation, in seconds
    pub generation_timeout_secs: u64,
    /// Token file location; the platform config directory when unset
    pub token_file: Option<PathBuf>,
    /// Branding shown by front ends
    pub branding: Branding,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            refresh_timeout_secs: 30,
            generation_timeout_secs: 120,
            token_file: None,
            branding: Branding::default(),
        }
    }
}

impl ClientConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read(path)?;
        Ok(from_json_bytes(&content)?)
    }

    /// Default bound for API requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Bound for spreadsheet generation.
    #[must_use]
    pub const fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Refresh settings for the session core.
    #[must_use]
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            endpoint: REFRESH_PATH.to_string(),
            timeout: Duration::from_secs(self.refresh_timeout_secs),
        }
    }

    /// Where tokens are persisted, if anywhere.
    #[must_use]
    pub fn token_path(&self) -> Option<PathBuf> {
        self.token_file.clone().or_else(FileTokenStore::default_path)
    }
}
