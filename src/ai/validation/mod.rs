//! Response Validation
//!
//! Turns raw completion text into a JSON object and checks its shape.
//! Every failure here is a `MalformedResponse`, which the retry executor
//! treats as fatal.

mod json_repair;

pub use json_repair::extract_json_object;

use serde_json::Value;

use crate::types::{PrdError, Result};

/// Fail unless every key in `required` is present on `value`
pub fn require_keys(value: &Value, required: &[&str], stage: &str) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| value.get(key).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PrdError::malformed(
            stage,
            format!("missing required keys: {}", missing.join(", ")),
        ))
    }
}

/// Parse `raw` and check its required keys in one step
pub fn parse_response(raw: &str, required: &[&str], stage: &str) -> Result<Value> {
    let value = extract_json_object(raw, stage)?;
    require_keys(&value, required, stage)?;
    Ok(value)
}
