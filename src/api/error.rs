//! Error taxonomy for Foglio API operations.

use reqwest::{Response, StatusCode};
use thiserror::Error;

use super::auth::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Credential missing, invalid, or revoked.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response, transport failure, or malformed body.
    #[error("{0}")]
    Remote(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

/// Whether the backend rejected the credential.
pub(crate) fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Extract the backend's error message from a failed response.
///
/// Error bodies are JSON with a `message` field. Falls back to the raw
/// body, then to the status line when the body is empty.
pub(crate) async fn backend_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    message_from_body(status, &body)
}

pub(crate) fn message_from_body(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(serde_json::Value::String(msg)) = map.get("message") {
            if !msg.is_empty() {
                return msg.clone();
            }
        }
        if let Some(serde_json::Value::String(err)) = map.get("error") {
            if !err.is_empty() {
                return format!("{} ({})", err, status.as_u16());
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_json_message_field() {
        let body = r#"{"status":400,"error":"Bad Request","message":"name is required"}"#;
        assert_eq!(
            message_from_body(StatusCode::BAD_REQUEST, body),
            "name is required"
        );
    }

    #[test]
    fn test_message_falls_back_to_error_field() {
        let body = r#"{"status":500,"error":"Internal Server Error","message":""}"#;
        assert_eq!(
            message_from_body(StatusCode::INTERNAL_SERVER_ERROR, body),
            "Internal Server Error (500)"
        );
    }

    #[test]
    fn test_message_uses_raw_body_then_status() {
        assert_eq!(
            message_from_body(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(
            message_from_body(StatusCode::NOT_FOUND, ""),
            "404 Not Found"
        );
    }

    #[test]
    fn test_auth_statuses() {
        assert!(is_auth_status(StatusCode::UNAUTHORIZED));
        assert!(is_auth_status(StatusCode::FORBIDDEN));
        assert!(!is_auth_status(StatusCode::NOT_FOUND));
    }
}
