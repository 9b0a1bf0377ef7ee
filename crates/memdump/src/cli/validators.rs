//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain::GENERATION_SEPARATOR;

/// Validate a record address.
///
/// Accepts hexadecimal locations (`0x7f01`), generation-qualified ones
/// (`0x7f01#12`) and root names (`vm`). Surrounding whitespace is trimmed.
pub fn validate_address(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Address cannot be empty".to_string());
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!("Invalid address '{s}': addresses cannot contain whitespace"));
    }

    if let Some((_, generation)) = s.rsplit_once(GENERATION_SEPARATOR)
        && generation.is_empty()
    {
        return Err(format!(
            "Invalid address '{s}': expected a generation number after '{GENERATION_SEPARATOR}'"
        ));
    }

    Ok(s.to_string())
}

/// Validate a record type tag such as `HASH` or `IMEMO`.
pub fn validate_type_tag(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Type cannot be empty".to_string());
    }

    if !s.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return Err(format!(
            "Invalid type '{s}': types are upper-case tags such as HASH or IMEMO"
        ));
    }

    Ok(s.to_string())
}
