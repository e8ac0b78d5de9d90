//! Nimbus Application - Session core, ports and use cases
//!
//! This crate defines the application layer with:
//! - Port traits (transport, token storage, clock, notifications)
//! - The authenticated session core: single-flight token refresh,
//!   bearer attachment and observable session state
//! - The navigation guard
//! - Thin services over the reporting API

pub mod auth;
pub mod error;
pub mod navigation;
pub mod ports;
pub mod services;

pub use auth::{
    AuthenticatedClient, LogoutReason, MemoryTokenStore, RefreshConfig, RefreshCoordinator,
    SessionError, SessionEvent, SessionManager, SessionSnapshot, SessionState,
};
pub use error::{ApplicationError, ApplicationResult};
pub use navigation::{NavigationGuard, SessionView};
pub use ports::{Clock, HttpClientError, HttpTransport, Notifier, TokenStore, TokenStoreError};
pub use services::{
    Catalog, DEFAULT_GENERATION_TIMEOUT, DownloadedFile, ExportService, ResourceService,
};
