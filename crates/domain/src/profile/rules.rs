//! Ordered name extraction rules

use serde_json::{Map, Value};

/// First and last name produced by a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedName {
    /// Given name
    pub first: Option<String>,
    /// Family name(s)
    pub last: Option<String>,
}

impl ResolvedName {
    const fn is_empty(&self) -> bool {
        self.first.is_none() && self.last.is_none()
    }
}

/// A pure rule extracting a name from a raw profile object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// `first_name` / `last_name` as sent by the server.
    Explicit,
    /// Localized `nombre` / `apellido` fields.
    Localized,
    /// A single full-name string split on whitespace.
    FullName,
}

const FULL_NAME_FIELDS: [&str; 2] = ["nombre_completo", "full_name"];

impl NameRule {
    /// Rules in priority order.
    pub const ORDER: [Self; 3] = [Self::Explicit, Self::Localized, Self::FullName];

    /// Applies this rule alone. Returns `None` when the rule does not match.
    #[must_use]
    pub fn extract(self, raw: &Map<String, Value>) -> Option<ResolvedName> {
        let resolved = match self {
            Self::Explicit => ResolvedName {
                first: text(raw, "first_name"),
                last: text(raw, "last_name"),
            },
            Self::Localized => ResolvedName {
                first: text(raw, "nombre"),
                last: text(raw, "apellido"),
            },
            Self::FullName => FULL_NAME_FIELDS
                .iter()
                .find_map(|field| text(raw, field))
                .map(|full| split_full_name(&full))
                .unwrap_or_default(),
        };
        (!resolved.is_empty()).then_some(resolved)
    }

    /// Applies the rules in [`Self::ORDER`]; the first match wins.
    #[must_use]
    pub fn resolve(raw: &Map<String, Value>) -> ResolvedName {
        Self::ORDER
            .iter()
            .find_map(|rule| rule.extract(raw))
            .unwrap_or_default()
    }
}

fn text(raw: &Map<String, Value>, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn split_full_name(full: &str) -> ResolvedName {
    let mut tokens = full.split_whitespace();
    let first = tokens.next().map(String::from);
    let rest: Vec<&str> = tokens.collect();
    ResolvedName {
        first,
        last: (!rest.is_empty()).then(|| rest.join(" ")),
    }
}
