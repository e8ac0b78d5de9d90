//! Authenticated session core.
//!
//! This module provides:
//! - In-memory token storage
//! - Single-flight access token refresh with FIFO follower replay
//! - An HTTP client that attaches bearer tokens and recovers from expiry
//! - Observable session state and its owning context object

mod client;
mod coordinator;
mod error;
mod manager;
mod state;
mod token_store;

pub use client::AuthenticatedClient;
pub use coordinator::{RefreshConfig, RefreshCoordinator};
pub use error::SessionError;
pub use manager::SessionManager;
pub use state::{LogoutReason, SessionEvent, SessionSnapshot, SessionState};
pub use token_store::MemoryTokenStore;
