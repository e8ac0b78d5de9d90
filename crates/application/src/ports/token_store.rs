//! Token storage port

use nimbus_domain::{TokenKey, TokenPair};
use thiserror::Error;

/// Failure to persist tokens. Never retried; propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStoreError {
    /// The backing medium failed.
    #[error("token storage I/O error: {0}")]
    Io(String),

    /// Stored data could not be encoded or decoded.
    #[error("token storage serialization error: {0}")]
    Serialization(String),
}

/// Synchronous key-value holder for the access and refresh tokens.
///
/// Writes are visible to every subsequent `get` in the same process.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    fn get(&self, key: TokenKey) -> Option<String>;

    /// Stores a token, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    fn set(&self, key: TokenKey, value: &str) -> Result<(), TokenStoreError>;

    /// Removes a token. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, key: TokenKey) -> Result<(), TokenStoreError>;

    /// Stores both tokens of a pair.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure.
    fn store_pair(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        self.set(TokenKey::Access, &pair.access)?;
        self.set(TokenKey::Refresh, &pair.refresh)
    }

    /// Removes both tokens.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure; both removals are attempted.
    fn clear(&self) -> Result<(), TokenStoreError> {
        let access = self.remove(TokenKey::Access);
        let refresh = self.remove(TokenKey::Refresh);
        access.and(refresh)
    }
}
