//! Nimbus Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the reqwest transport, the
//! file-backed token store, the system clock and a log notifier.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestTransport, SystemClock, TracingNotifier};
pub use config::{ClientConfig, ConfigError, DEFAULT_BASE_URL};
pub use persistence::FileTokenStore;
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
