//! Route access checks.

mod guard;

pub use guard::{NavigationGuard, SessionView};
