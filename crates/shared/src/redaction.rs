//! Secret detection and redaction for log fields and config dumps.
//!
//! Telemetry payloads passed through `add_data` may carry credentials from
//! upstream sources; anything that looks like a secret is masked before it
//! reaches a sink.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use pipeline_telemetry_shared::is_secret_key;
///
/// assert!(is_secret_key("API_KEY"));
/// assert!(is_secret_key("sourcePassword"));
/// assert!(!is_secret_key("PIPELINE_TELEMETRY_LOG_LEVEL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"]
        .iter()
        .any(|needle| key.contains(needle))
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use pipeline_telemetry_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("token", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("category", "WEATHER"), "WEATHER");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
