//! Nimbus Domain - Core session and reporting types
//!
//! This crate defines the domain model for the Nimbus reporting client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod branding;
pub mod error;
pub mod export;
pub mod navigation;
pub mod profile;
pub mod request;
pub mod response;

pub use auth::{
    ApiErrorBody, PROFILE_PATH, REFRESH_PATH, RefreshRequest, RefreshResponse, TOKEN_NOT_VALID,
    TokenKey, TokenPair,
};
pub use branding::Branding;
pub use error::{DomainError, DomainResult};
pub use export::{ExportInfo, ExportKind};
pub use navigation::{
    NavigationDecision, Notice, NoticeLevel, NoticePosition, Route, RouteMeta, RouteName,
    RouteTable,
};
pub use profile::{NameRule, UserProfile};
pub use request::{AUTHORIZATION, HttpMethod, RequestSpec, ResponseType};
pub use response::ResponseSpec;
