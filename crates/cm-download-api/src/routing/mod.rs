//! Request routing.
//!
//! Routes are declared as `"METHODS /path/@param"` patterns (see
//! [`RoutePattern`]) and collected in an ordered [`RouteTable`]. The first
//! route whose pattern matches a request wins.

use crate::error::RouteError;
use axum::http::Method;

pub mod pattern;

pub use pattern::{RouteMatch, RoutePattern};

/// Ordered list of route patterns and the targets they resolve to.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<(RoutePattern, H)>,
}

impl<H> RouteTable<H> {
    /// Create an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` if the pattern cannot be compiled.
    pub fn add(&mut self, pattern: &str, target: H) -> Result<&mut Self, RouteError> {
        self.routes.push((RoutePattern::new(pattern)?, target));
        Ok(self)
    }

    /// Find the first route matching the request.
    #[must_use]
    pub fn route(&self, method: &Method, uri: &str) -> Option<(&H, RouteMatch)> {
        self.routes
            .iter()
            .find_map(|(pattern, target)| pattern.matches(method, uri).map(|m| (target, m)))
    }

    /// Whether any route matches the request.
    #[must_use]
    pub fn is_routable(&self, method: &Method, uri: &str) -> bool {
        self.route(method, uri).is_some()
    }

    /// Whether any route's path template matches `uri`, ignoring methods.
    #[must_use]
    pub fn matches_path(&self, uri: &str) -> bool {
        self.routes.iter().any(|(pattern, _)| pattern.matches_path(uri))
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
