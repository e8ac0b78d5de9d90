//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod http_transport;
mod notifier;
mod token_store;

pub use clock::Clock;
pub use http_transport::{HttpClientError, HttpTransport};
pub use notifier::Notifier;
pub use token_store::{TokenStore, TokenStoreError};
