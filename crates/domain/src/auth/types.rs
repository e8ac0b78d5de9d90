//! Token and wire types for the bearer/refresh scheme

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code the API puts in a 401 body when the access token expired.
pub const TOKEN_NOT_VALID: &str = "token_not_valid";

/// Endpoint exchanging a refresh token for a new access token.
pub const REFRESH_PATH: &str = "/token/refresh/";

/// Endpoint returning the current user's profile.
pub const PROFILE_PATH: &str = "/user/me/";

/// Keys under which tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKey {
    /// Short-lived bearer credential.
    Access,
    /// Long-lived credential used to mint new access tokens.
    Refresh,
}

impl TokenKey {
    /// Returns the storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque access/refresh credential pair issued at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token
    pub access: String,
    /// Refresh token
    pub refresh: String,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens never show up in logs.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /token/refresh/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The stored refresh token
    pub refresh: String,
}

/// Successful response of `POST /token/refresh/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// The new access token
    pub access: String,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable detail
    #[serde(default)]
    pub detail: Option<String>,
}
