//! Input validation primitives.

use crate::error::{Error, Result};

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None))
    } else {
        Ok(trimmed)
    }
}

/// Parse a `KEY=VALUE` pair. The value may itself contain `=`.
pub fn parse_key_value(input: &str) -> Result<(String, String)> {
    let (key, value) = input.split_once('=').ok_or_else(|| {
        Error::validation_invalid_argument(
            "var",
            format!("Expected KEY=VALUE, got '{}'", input),
            None,
        )
    })?;

    let key = require_non_empty(key, "var", "Variable name cannot be empty")?;
    Ok((key.to_string(), value.to_string()))
}
