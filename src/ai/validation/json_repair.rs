//! JSON Repair
//!
//! Recovers a JSON object from model output that is almost, but not quite,
//! bare JSON:
//! - Markdown code fence wrapping (```json ... ```)
//! - Leading byte-order mark
//! - Trailing commas before `}` or `]`
//! - Object embedded in explanatory text
//!
//! Anything still unparsable after these steps is a malformed response.

use serde_json::Value;
use tracing::debug;

use crate::types::{PrdError, Result, take_chars};

/// Parse the JSON object in `raw`, repairing common formatting issues.
///
/// `stage` names the caller in the resulting `MalformedResponse`.
pub fn extract_json_object(raw: &str, stage: &str) -> Result<Value> {
    let cleaned = preprocess(raw);

    let candidates = [
        Some(cleaned.clone()),
        Some(fix_trailing_commas(&cleaned)),
        outermost_object(&cleaned).map(str::to_string),
        outermost_object(&cleaned).map(fix_trailing_commas),
    ];

    for (step, candidate) in candidates.into_iter().flatten().enumerate() {
        match serde_json::from_str::<Value>(&candidate) {
            Ok(value @ Value::Object(_)) => {
                if step > 0 {
                    debug!(stage, step, "JSON recovered after repair");
                }
                return Ok(value);
            }
            Ok(_) => {
                return Err(PrdError::malformed(stage, "response is JSON but not an object"));
            }
            Err(_) => continue,
        }
    }

    Err(PrdError::malformed(
        stage,
        format!("response is not valid JSON: {}...", take_chars(&cleaned, 120)),
    ))
}

fn preprocess(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
    strip_code_fences(trimmed).trim().to_string()
}

fn strip_code_fences(s: &str) -> &str {
    let mut result = s;
    if result.starts_with("```")
        && let Some(first_newline) = result.find('\n')
    {
        result = &result[first_newline + 1..];
    }
    if let Some(stripped) = result.trim_end().strip_suffix("```") {
        result = stripped;
    }
    result
}

/// Slice from the first `{` to the last `}`
fn outermost_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

/// Remove commas that directly precede a closing bracket, outside strings
fn fix_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
