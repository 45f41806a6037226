//! Environment variable overrides.

use std::time::Duration;

/// Read a millisecond duration from `var_name`
///
/// Unset, empty, unparseable and zero values all yield `None` so the caller
/// keeps its configured default.
pub fn duration_ms_from_env(var_name: &str) -> Option<Duration> {
    let raw = std::env::var(var_name).ok()?;
    parse_duration_ms(&raw)
}

fn parse_duration_ms(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}

/// Read a non-empty string from `var_name`
pub fn non_empty_var(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
