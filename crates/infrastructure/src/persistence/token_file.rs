//! File-backed token storage.
//!
//! Tokens are stored in the platform-specific config directory:
//! - Linux: ~/.config/nimbus/tokens.json
//! - macOS: ~/Library/Application Support/nimbus/tokens.json
//! - Windows: %APPDATA%/nimbus/tokens.json

use std::fs;
use std::path::{Path, PathBuf};

use nimbus_application::{TokenStore, TokenStoreError};
use nimbus_domain::TokenKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

/// Contents of the token file.
///
/// ```json
/// {
///   "schema_version": 1,
///   "access": "eyJ...",
///   "refresh": "eyJ..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenFile {
    schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

impl Default for TokenFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            access: None,
            refresh: None,
        }
    }
}

impl TokenFile {
    const fn slot(&self, key: TokenKey) -> Option<&String> {
        match key {
            TokenKey::Access => self.access.as_ref(),
            TokenKey::Refresh => self.refresh.as_ref(),
        }
    }

    const fn slot_mut(&mut self, key: TokenKey) -> &mut Option<String> {
        match key {
            TokenKey::Access => &mut self.access,
            TokenKey::Refresh => &mut self.refresh,
        }
    }
}

/// Token store persisted as a JSON file, with an in-memory cache.
///
/// Writes go to disk first; the cache only changes once the write
/// succeeded, so a failed write leaves both in their previous state.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: RwLock<TokenFile>,
}

impl FileTokenStore {
    /// Default location of the token file, if the platform has a config
    /// directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nimbus").join("tokens.json"))
    }

    /// Opens the store at `path`, loading any tokens already saved there.
    ///
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let path = path.into();
        let cache = if path.exists() {
            let content = fs::read(&path).map_err(|e| TokenStoreError::Io(e.to_string()))?;
            from_json_bytes(&content).map_err(|e| TokenStoreError::Serialization(e.to_string()))?
        } else {
            TokenFile::default()
        };
        debug!(path = %path.display(), "opened token file");
        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, key: TokenKey, value: Option<&str>) -> Result<(), TokenStoreError> {
        let mut cache = self.cache.write();
        let mut next = cache.clone();
        *next.slot_mut(key) = value.map(str::to_string);
        if next == *cache {
            return Ok(());
        }

        self.persist(&next)?;
        *cache = next;
        Ok(())
    }

    fn persist(&self, file: &TokenFile) -> Result<(), TokenStoreError> {
        if file.access.is_none() && file.refresh.is_none() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(TokenStoreError::Io(e.to_string())),
            };
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| TokenStoreError::Io(e.to_string()))?;
        }
        let content =
            to_json_stable_bytes(file).map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| TokenStoreError::Io(e.to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> Option<String> {
        self.cache.read().slot(key).cloned()
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<(), TokenStoreError> {
        self.update(key, Some(value))
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStoreError> {
        self.update(key, None)
    }
}
