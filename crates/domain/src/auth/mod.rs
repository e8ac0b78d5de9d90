//! Authentication domain types

mod types;

pub use types::{
    ApiErrorBody, PROFILE_PATH, REFRESH_PATH, RefreshRequest, RefreshResponse, TOKEN_NOT_VALID,
    TokenKey, TokenPair,
};
