use std::time::Duration;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a whole number of `unit`s (e.g. seconds) from a string value. Returns `None` for missing or malformed values
/// so that callers can log and fall back to their default.
pub fn parse_duration(value: Option<&str>, unit: Duration) -> Option<Duration> {
    let n = value?.trim().parse::<u32>().ok()?;
    Some(unit * n)
}
