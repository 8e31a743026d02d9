//! API error types and HTTP status translation.

use reqwest::StatusCode;

/// Errors that can occur while talking to the Eclipse or Orion APIs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("client configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Human-readable message for a failed response body.
///
/// Prefers the JSON `message` field, then the raw body, then the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

/// Map a non-success status and its body onto the error taxonomy.
pub fn from_status(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(status, body);
    match status.as_u16() {
        401 | 403 => ApiError::Auth(message),
        404 => ApiError::NotFound(message),
        429 => ApiError::RateLimit(message),
        code => ApiError::Api {
            status: code,
            message,
        },
    }
}
