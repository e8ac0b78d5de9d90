//! User profile normalization
//!
//! The profile endpoint returns heterogeneous shapes depending on the
//! backend version. [`UserProfile`] keeps the raw object and fills in
//! `first_name`/`last_name` by walking [`NameRule::ORDER`].

mod rules;
mod user;

pub use rules::{NameRule, ResolvedName};
pub use user::UserProfile;
