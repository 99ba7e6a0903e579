//! Token Estimation
//!
//! Token cost is estimated with a fixed character-to-token ratio
//! (`CHARS_PER_TOKEN`). This is an approximation, not a tokenizer: real
//! counts vary by model and by content (code usually tokenizes denser than
//! prose). Every budget in the pipeline is enforced against this estimate,
//! so the guarantees are "estimated tokens never exceed the ceiling", which
//! holds exactly, while the real token count is only approximately bounded.

use crate::constants::tokens::CHARS_PER_TOKEN;
use crate::types::take_chars;

/// Estimated token cost of `text`
#[inline]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Largest character count whose estimate fits in `tokens`
#[inline]
pub fn chars_for_tokens(tokens: usize) -> usize {
    tokens.saturating_mul(CHARS_PER_TOKEN)
}

/// Marker appended to truncated text
pub fn truncation_marker(dropped_chars: usize) -> String {
    format!("\n\n[... truncated {} characters]", dropped_chars)
}

/// Cut `text` so that its estimate, marker included, fits in `max_tokens`.
///
/// Returns the text unchanged when it already fits, and `None` when the
/// budget cannot even hold the truncation marker.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> Option<String> {
    if estimate_tokens(text) <= max_tokens {
        return Some(text.to_string());
    }

    let total_chars = text.chars().count();
    let budget_chars = chars_for_tokens(max_tokens);
    // Upper bound: the dropped count never has more digits than the total
    let marker_bound = truncation_marker(total_chars).chars().count();
    if budget_chars <= marker_bound {
        return None;
    }

    let keep = budget_chars - marker_bound;
    let dropped = total_chars - keep;
    let mut truncated = take_chars(text, keep).to_string();
    truncated.push_str(&truncation_marker(dropped));
    Some(truncated)
}
