//! Feature Detectors
//!
//! Independent heuristic extractors over file contents. Every detector is a
//! pure function of `(content, path)` driven by a table of
//! `pattern → fact shape` rules, and never fails: content that matches
//! nothing contributes nothing.

pub mod api;
pub mod data_model;
pub mod events;
pub mod navigation;
pub mod state;

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::types::log_skip;

/// Facts from one file plus a best-effort framework tag
#[derive(Debug, Clone, PartialEq)]
pub struct Detection<T> {
    pub facts: Vec<T>,
    pub framework: Option<String>,
}

impl<T> Default for Detection<T> {
    fn default() -> Self {
        Self {
            facts: Vec::new(),
            framework: None,
        }
    }
}

impl<T> Detection<T> {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Keep the first framework tag seen
    pub(crate) fn tag(&mut self, framework: &str) {
        if self.framework.is_none() {
            self.framework = Some(framework.to_string());
        }
    }
}

// =============================================================================
// Rule Tables
// =============================================================================

/// One table-driven rule: a pattern plus the static data it maps to
pub(crate) struct Rule<M> {
    pub regex: Regex,
    pub meta: M,
}

/// Compile a rule table; a pattern that fails to compile is logged and left out
pub(crate) fn compile<M: Copy>(table: &[(&str, M)]) -> Vec<Rule<M>> {
    table
        .iter()
        .filter_map(|(pattern, meta)| {
            log_skip(Regex::new(pattern), pattern).map(|regex| Rule { regex, meta: *meta })
        })
        .collect()
}

/// Compile a single pattern, `None` if it is invalid
pub(crate) fn compile_one(pattern: &str) -> Option<Regex> {
    log_skip(Regex::new(pattern), pattern)
}

/// String literal in any JS quoting style; pair with [`literal`]
pub(crate) const STRING_LITERAL: &str = r#"(?:'([^'\n]*)'|"([^"\n]*)"|`([^`]*)`)"#;

/// First non-empty capture group at or after `from`
pub(crate) fn literal<'t>(caps: &Captures<'t>, from: usize) -> Option<&'t str> {
    (from..caps.len())
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str())
        .find(|s| !s.is_empty())
}

// =============================================================================
// Path Normalization
// =============================================================================

static DYNAMIC_SEGMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\$\{[^}]*\}",             // template interpolation
        r"\[[^\]]*\]",              // [id], [...slug]
        r"<[^>]*>",                 // <int:id>
        r"\{[^}]*\}",               // {id}
        r":[A-Za-z_][A-Za-z0-9_]*", // :id
    ]
    .iter()
    .filter_map(|p| compile_one(p))
    .collect()
});

static LEADING_INTERPOLATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_one(r"^(?:\$\{[^}]*\}|[A-Z_][A-Z0-9_]*\s*\+\s*)+"));

/// Placeholder for any dynamic path segment
pub const PARAM: &str = ":param";

/// Normalize a raw path literal to a comparable route.
///
/// Strips a leading base-URL interpolation, origin, query string and
/// trailing slash; replaces dynamic segments with [`PARAM`]. Returns `None`
/// for literals that are not paths.
pub fn normalize_path(raw: &str) -> Option<String> {
    let mut path = raw.trim().to_string();

    if let Some(re) = LEADING_INTERPOLATION.as_ref() {
        path = re.replace(&path, "").into_owned();
    }

    if path.starts_with("http://") || path.starts_with("https://") {
        let placeholder = DYNAMIC_SEGMENTS
            .first()
            .map(|re| re.replace_all(&path, "__param__").into_owned())
            .unwrap_or_else(|| path.clone());
        path = url::Url::parse(&placeholder)
            .ok()?
            .path()
            .replace("__param__", PARAM);
    }

    if let Some(idx) = path.find(['?', '#']) {
        path.truncate(idx);
    }

    if path.is_empty() || path.chars().any(char::is_whitespace) || path.starts_with("mailto:") {
        return None;
    }

    for re in DYNAMIC_SEGMENTS.iter() {
        path = re.replace_all(&path, PARAM).into_owned();
    }

    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    while path.contains("//") {
        path = path.replace("//", "/");
    }

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dynamic_segments() {
        assert_eq!(normalize_path("/users/${id}").as_deref(), Some("/users/:param"));
        assert_eq!(normalize_path("/users/[id]/posts").as_deref(), Some("/users/:param/posts"));
        assert_eq!(normalize_path("/users/:userId").as_deref(), Some("/users/:param"));
        assert_eq!(normalize_path("/items/{item_id}").as_deref(), Some("/items/:param"));
        assert_eq!(normalize_path("/items/<int:id>").as_deref(), Some("/items/:param"));
    }

    #[test]
    fn test_normalize_strips_base_query_and_slash() {
        assert_eq!(normalize_path("${API_URL}/orders/").as_deref(), Some("/orders"));
        assert_eq!(normalize_path("BASE_URL + /orders").as_deref(), Some("/orders"));
        assert_eq!(
            normalize_path("https://api.example.com/v1/orders?page=2").as_deref(),
            Some("/v1/orders")
        );
        assert_eq!(
            normalize_path("https://api.example.com/users/${id}").as_deref(),
            Some("/users/:param")
        );
        assert_eq!(normalize_path("/").as_deref(), Some("/"));
    }

    #[test]
    fn test_normalize_rejects_non_paths() {
        assert_eq!(normalize_path(""), None);
        assert_eq!(normalize_path("hello world"), None);
        assert_eq!(normalize_path("?page=1"), None);
    }

    #[test]
    fn test_literal_picks_first_quoted_group() {
        let re = Regex::new(&format!(r"fetch\({}", STRING_LITERAL)).unwrap();
        let caps = re.captures("fetch(`/a/${b}`)").unwrap();
        assert_eq!(literal(&caps, 1), Some("/a/${b}"));
    }
}
