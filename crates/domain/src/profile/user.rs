//! Normalized user profile

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NameRule;
use crate::error::DomainError;

const ADMIN_FLAGS: [&str; 3] = ["is_admin", "is_staff", "is_superuser"];

/// Profile returned by `GET /user/me/`, with names normalized.
///
/// The raw object is kept so unknown fields survive; `first_name` and
/// `last_name` are written back into it when a rule resolves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct UserProfile {
    raw: Map<String, Value>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl UserProfile {
    /// Normalizes a raw profile object.
    #[must_use]
    pub fn normalize(mut raw: Map<String, Value>) -> Self {
        let resolved = NameRule::resolve(&raw);
        if let Some(first) = &resolved.first {
            raw.insert("first_name".to_string(), Value::String(first.clone()));
        }
        if let Some(last) = &resolved.last {
            raw.insert("last_name".to_string(), Value::String(last.clone()));
        }
        Self {
            raw,
            first_name: resolved.first,
            last_name: resolved.last,
        }
    }

    /// Given name, if any rule resolved one.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Family name(s), if any rule resolved them.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Name suitable for display, falling back to `username`.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name(), self.last_name()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => self
                .raw
                .get("username")
                .and_then(Value::as_str)
                .map(String::from),
        }
    }

    /// Returns a raw field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }

    /// Returns true only when `field` is the JSON literal `true`.
    #[must_use]
    pub fn flag(&self, field: &str) -> bool {
        matches!(self.raw.get(field), Some(Value::Bool(true)))
    }

    /// Union of the admin, staff and superuser flags, or `role == "admin"`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        ADMIN_FLAGS.iter().any(|flag| self.flag(flag))
            || self.raw.get("role").and_then(Value::as_str) == Some("admin")
    }

    /// Returns the normalized object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl TryFrom<Value> for UserProfile {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(raw) => Ok(Self::normalize(raw)),
            other => Err(DomainError::InvalidPayload(format!(
                "profile must be a JSON object, got {other}"
            ))),
        }
    }
}

impl From<UserProfile> for Value {
    fn from(profile: UserProfile) -> Self {
        Self::Object(profile.raw)
    }
}
