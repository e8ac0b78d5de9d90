//! In-memory token storage.
//!
//! Backs ephemeral sessions and tests; the file-backed store lives in the
//! infrastructure crate.

use std::collections::HashMap;

use nimbus_domain::{TokenKey, TokenPair};
use parking_lot::RwLock;

use crate::ports::{TokenStore, TokenStoreError};

/// Thread-safe in-memory token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKey, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token pair.
    #[must_use]
    pub fn with_pair(pair: &TokenPair) -> Self {
        let store = Self::new();
        {
            let mut tokens = store.tokens.write();
            tokens.insert(TokenKey::Access, pair.access.clone());
            tokens.insert(TokenKey::Refresh, pair.refresh.clone());
        }
        store
    }

    /// Get count of stored tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Returns true if no token is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> Option<String> {
        self.tokens.read().get(&key).cloned()
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<(), TokenStoreError> {
        self.tokens.write().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStoreError> {
        self.tokens.write().remove(&key);
        Ok(())
    }
}
