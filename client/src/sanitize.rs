//! Redaction of credentials before request/response bodies reach the log.

use serde_json::Value;

pub const REDACTED: &str = "***REDACTED***";

const SENSITIVE: &[&str] = &[
    "token",
    "password",
    "pwd",
    "secret",
    "api_key",
    "apikey",
    "session",
    "authorization",
];

/// Whether a JSON key looks like it carries a credential.
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE.iter().any(|needle| key.contains(needle))
}

/// Copy of `value` with every sensitive key's value replaced, at any depth.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive_key(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        sanitize(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

/// Sanitized rendering of a raw body for debug logs. Non-JSON bodies are
/// truncated rather than parsed.
pub fn for_log(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => sanitize(&json).to_string(),
        Err(_) => body.chars().take(200).collect(),
    }
}
