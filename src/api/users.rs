//! User registration and lookup.

use super::client::{ApiClient, RequestError};
use super::error::{backend_message, is_auth_status, ApiError};
use super::types::User;

/// Names shorter than this are rejected before any request is made.
pub const MIN_NAME_LEN: usize = 3;

/// Check a display name locally. Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Name must be at least {} characters long",
            MIN_NAME_LEN
        )));
    }
    Ok(trimmed)
}

/// Register a new user.
///
/// POST /users/register?name={name}. The returned user carries the only copy
/// of the API key the backend will ever hand out.
pub async fn register(client: &ApiClient, name: &str) -> Result<User, ApiError> {
    let name = validate_name(name)?;
    let path = format!("/users/register?name={}", urlencoding::encode(name));

    let resp = client.post(&path).await.map_err(remote)?;
    if !resp.status().is_success() {
        return Err(ApiError::Remote(backend_message(resp).await));
    }

    let user: User = resp
        .json()
        .await
        .map_err(|e| ApiError::Remote(format!("Failed to parse register response: {}", e)))?;
    user.validate().map_err(ApiError::Remote)?;
    Ok(user)
}

/// Resolve the user owning the stored credential.
///
/// GET /users/me. Fails with [`ApiError::Auth`] when no credential is stored
/// or the backend rejects it.
pub async fn get_current_user(client: &ApiClient) -> Result<User, ApiError> {
    if client.stored_api_key()?.is_none() {
        return Err(ApiError::Auth("no API key stored".to_string()));
    }

    let resp = client.authenticated_get("/users/me").await.map_err(remote)?;
    let status = resp.status();
    if is_auth_status(status) {
        return Err(ApiError::Auth(format!("API key rejected ({})", status)));
    }
    if !status.is_success() {
        return Err(ApiError::Remote(backend_message(resp).await));
    }

    let user: User = resp
        .json()
        .await
        .map_err(|e| ApiError::Remote(format!("Failed to parse user response: {}", e)))?;
    user.validate().map_err(ApiError::Remote)?;
    Ok(user)
}

pub(crate) fn remote(err: RequestError) -> ApiError {
    match err {
        RequestError::Store(e) => ApiError::Store(e),
        RequestError::Transport(e) => ApiError::Remote(e.to_string()),
    }
}
