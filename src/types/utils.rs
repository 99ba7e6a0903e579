//! Shared utility functions.
//!
//! ## JSON Extraction Helpers
//!
//! Ergonomic helpers for reading loosely shaped `serde_json::Value`s returned
//! by the completion service.

use std::fmt::Display;

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract string from JSON value by key.
#[inline]
pub fn json_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(String::from)
}

// =============================================================================
// String Utilities
// =============================================================================

/// Capitalize the first character of a string.
#[inline]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// First `max_chars` characters of `s`, never splitting a code point.
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// Result Helpers
// =============================================================================

/// Log a best-effort failure at debug level and drop it.
///
/// Used where a single unreadable input must not abort the whole stage.
pub fn log_skip<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("Skipping {}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_helpers() {
        let v = json!({"name": "acme", "count": 1});
        assert_eq!(json_string(&v, "name").as_deref(), Some("acme"));
        assert_eq!(json_string(&v, "count"), None);
        assert_eq!(json_string(&v, "missing"), None);
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("dashboard"), "Dashboard");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_take_chars_respects_code_points() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
    }
}
