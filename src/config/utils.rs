use std::env;
use std::str::FromStr;

/// Parse a boolean value from a string, supporting multiple formats
///
/// Accepts: "true", "false", "1", "0", "yes", "no" (case insensitive)
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Read and parse an environment variable. Unset yields `Ok(None)`, a value
/// that does not parse is an error naming the variable.
pub fn parse_env<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} environment variable: {e}")),
        Err(_) => Ok(None),
    }
}

/// Read a boolean environment variable
pub fn parse_env_bool(name: &str) -> Result<Option<bool>, String> {
    match env::var(name) {
        Ok(raw) => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid {name} environment variable: '{raw}' is not a boolean")),
        Err(_) => Ok(None),
    }
}
