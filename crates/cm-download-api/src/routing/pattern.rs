//! Route pattern compilation and matching.

use crate::error::RouteError;
use axum::http::Method;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Methods selected by `*`.
const ALL_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

#[allow(clippy::expect_used)]
static METHOD_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:(?:GET|HEAD|POST|PUT|PATCH|DELETE|OPTIONS)\|)*(?:GET|HEAD|POST|PUT|PATCH|DELETE|OPTIONS)|\*)\s+",
    )
    .expect("method spec pattern is valid")
});

/// A compiled route pattern such as `"POST /item/@id/@action"`.
///
/// The pattern starts with `|`-separated HTTP methods (or `*` for all of
/// them), followed by a path template. Segments written `@name` match one or
/// more non-slash characters and are captured under `name`. The whole URI
/// must match, and a trailing slash is optional.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pattern: String,
    methods: HashSet<Method>,
    regex: Regex,
}

impl RoutePattern {
    /// Compile a route pattern.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` if the pattern has no method specification or
    /// the template produces an invalid regular expression (for example a
    /// placeholder name used twice).
    pub fn new(pattern: &str) -> Result<Self, RouteError> {
        let (methods, path) = split_methods(pattern)
            .ok_or_else(|| RouteError::MissingMethods(pattern.to_string()))?;

        let regex = Regex::new(&compile_path(path)).map_err(|source| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            methods,
            regex,
        })
    }

    /// The original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compiled regular expression for the path template.
    #[must_use]
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the route accepts `method`.
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Whether `uri` matches the path template, whatever the method.
    #[must_use]
    pub fn matches_path(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }

    /// Match a request, returning its captures.
    ///
    /// `uri` is the request path without query string. Returns `None` when
    /// the method is not accepted or the path does not match.
    #[must_use]
    pub fn matches(&self, method: &Method, uri: &str) -> Option<RouteMatch> {
        if !self.allows(method) {
            return None;
        }

        let caps = self.regex.captures(uri)?;
        let positional = caps
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        let named = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();

        Some(RouteMatch { positional, named })
    }
}

/// Captures from a successful route match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    positional: Vec<Option<String>>,
    named: HashMap<String, String>,
}

impl RouteMatch {
    /// Capture by position; 0 is the whole URI, then placeholders in order.
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index)?.as_deref()
    }

    /// Capture by placeholder name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Number of positional captures, including the whole match.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Whether there are no captures at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }
}

/// Split `"GET|POST /path"` into its deduplicated methods and the path.
fn split_methods(pattern: &str) -> Option<(HashSet<Method>, &str)> {
    let caps = METHOD_SPEC.captures(pattern)?;
    let spec = caps.get(1)?.as_str();
    let rest = &pattern[caps.get(0)?.end()..];

    let methods = if spec == "*" {
        ALL_METHODS.into_iter().collect()
    } else {
        spec.split('|')
            .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
            .collect()
    };

    Some((methods, rest))
}

/// Compile a path template into an anchored regular expression.
fn compile_path(path: &str) -> String {
    let body = path
        .trim_end_matches('/')
        .split('/')
        .map(compile_segment)
        .collect::<Vec<_>>()
        .join("/");

    format!("^{body}/?$")
}

fn compile_segment(segment: &str) -> String {
    if let Some(rest) = segment.strip_prefix('@') {
        let name_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if name_len > 0 {
            let (name, literal) = rest.split_at(name_len);
            return format!("(?P<{name}>[^/]+){}", regex::escape(literal));
        }
    }
    regex::escape(segment)
}
