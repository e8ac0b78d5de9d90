//! Application routes and their access metadata

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Named routes of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteName {
    /// Login entry point
    Login,
    /// Default landing route
    Index,
    /// Work records
    Registros,
    /// Absences
    Licencias,
    /// Time control
    Controlhoras,
    /// Catch-all for unknown paths
    NotFound,
}

impl RouteName {
    /// Returns the route name as used by the router.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Index => "index",
            Self::Registros => "registros",
            Self::Licencias => "licencias",
            Self::Controlhoras => "controlhoras",
            Self::NotFound => "not-found",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "index" => Ok(Self::Index),
            "registros" => Ok(Self::Registros),
            "licencias" => Ok(Self::Licencias),
            "controlhoras" => Ok(Self::Controlhoras),
            "not-found" => Ok(Self::NotFound),
            other => Err(DomainError::UnknownRoute(other.to_string())),
        }
    }
}

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// The user must be logged in.
    #[serde(default)]
    pub requires_auth: bool,
    /// The user must hold an administrator flag.
    #[serde(default)]
    pub requires_admin: bool,
}

impl RouteMeta {
    /// No requirements.
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        requires_admin: false,
    };

    /// Logged-in users only.
    pub const AUTHENTICATED: Self = Self {
        requires_auth: true,
        requires_admin: false,
    };

    /// Logged-in administrators only.
    pub const ADMIN: Self = Self {
        requires_auth: true,
        requires_admin: true,
    };
}

/// A routable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route name
    pub name: RouteName,
    /// Path pattern
    pub path: String,
    /// Access requirements
    pub meta: RouteMeta,
}

impl Route {
    /// Creates a route.
    #[must_use]
    pub fn new(name: RouteName, path: impl Into<String>, meta: RouteMeta) -> Self {
        Self {
            name,
            path: path.into(),
            meta,
        }
    }
}

/// Ordered set of routes with a catch-all fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: Route,
}

impl RouteTable {
    /// Creates a table; `fallback` matches any unknown path.
    #[must_use]
    pub const fn new(routes: Vec<Route>, fallback: Route) -> Self {
        Self { routes, fallback }
    }

    /// Looks up a route by name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownRoute` if the name is not registered.
    pub fn by_name(&self, name: RouteName) -> Result<&Route, DomainError> {
        if self.fallback.name == name {
            return Ok(&self.fallback);
        }
        self.routes
            .iter()
            .find(|route| route.name == name)
            .ok_or_else(|| DomainError::UnknownRoute(name.to_string()))
    }

    /// Resolves a path, ignoring a trailing slash. Unknown paths resolve
    /// to the fallback route.
    #[must_use]
    pub fn resolve(&self, path: &str) -> &Route {
        let wanted = normalize(path);
        self.routes
            .iter()
            .find(|route| normalize(&route.path) == wanted)
            .unwrap_or(&self.fallback)
    }

    /// Iterates over the registered routes, fallback excluded.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            vec![
                Route::new(RouteName::Login, "/login/", RouteMeta::PUBLIC),
                Route::new(RouteName::Index, "/", RouteMeta::AUTHENTICATED),
                Route::new(RouteName::Registros, "/registros", RouteMeta::AUTHENTICATED),
                Route::new(RouteName::Licencias, "/licencias", RouteMeta::AUTHENTICATED),
                Route::new(
                    RouteName::Controlhoras,
                    "/control_horas",
                    RouteMeta::AUTHENTICATED,
                ),
            ],
            Route::new(RouteName::NotFound, "/:catchAll(.*)*", RouteMeta::AUTHENTICATED),
        )
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
