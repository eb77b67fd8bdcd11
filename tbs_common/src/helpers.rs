/// Parse a boolean flag from a string value, or return the given default value otherwise.
///
/// Accepts the usual suspects for truthy ("1", "true", "yes", "on") and falsy ("0", "false", "no", "off") values,
/// case-insensitively. Anything else falls back to `default`.
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

/// Parse a strictly positive integer (e.g. a timeout or TTL) from an optional string.
///
/// Returns `None` if the value is absent, is not a number, or is zero/negative, so that callers can log a warning and
/// fall back to their own default.
pub fn parse_positive_integer(value: Option<&str>) -> Option<u64> {
    value.and_then(|s| s.trim().parse::<u64>().ok()).filter(|v| *v > 0)
}
