//! File listing, upload, metadata, and link construction.
//!
//! Preview and download links are built locally. Public files get a bare
//! link; private files carry the stored credential as the `apiKey` query
//! parameter because browsers and download tools can't set headers.

use std::path::Path;

use reqwest::multipart;
use reqwest::StatusCode;

use super::client::{ApiClient, RequestError};
use super::error::{backend_message, is_auth_status, ApiError};
use super::types::FileRecord;
use super::users::remote;

/// Local file contents ready to be sent as the `file` multipart part.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    /// Content type is guessed from the file name's extension.
    pub fn new(file_name: &str, content: Vec<u8>) -> Self {
        let content_type = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name: file_name.to_string(),
            content_type,
            content,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Upload(format!("invalid file name: {}", path.display())))?;
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Upload(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(Self::new(file_name, content))
    }
}

/// List the files owned by the stored credential's user, in backend order.
///
/// GET /files
pub async fn list_own_files(client: &ApiClient) -> Result<Vec<FileRecord>, ApiError> {
    let resp = client.authenticated_get("/files").await.map_err(remote)?;
    let status = resp.status();
    if is_auth_status(status) {
        return Err(ApiError::Auth(backend_message(resp).await));
    }
    if !status.is_success() {
        return Err(ApiError::Remote(backend_message(resp).await));
    }

    let files: Vec<FileRecord> = resp
        .json()
        .await
        .map_err(|e| ApiError::Remote(format!("Failed to parse file list: {}", e)))?;
    for file in &files {
        file.validate().map_err(ApiError::Remote)?;
    }
    Ok(files)
}

/// Upload a file.
///
/// POST /files/upload with multipart parts `file` and `public` ("true"/"false").
pub async fn upload_file(
    client: &ApiClient,
    upload: FileUpload,
    is_public: bool,
) -> Result<FileRecord, ApiError> {
    let size = upload.content.len();
    let part = multipart::Part::bytes(upload.content)
        .file_name(upload.file_name.clone())
        .mime_str(&upload.content_type)
        .map_err(|e| ApiError::Upload(format!("Failed to create multipart part: {}", e)))?;

    let form = multipart::Form::new()
        .part("file", part)
        .text("public", is_public.to_string());

    log::info!(
        "Uploading {} ({} bytes, {})",
        upload.file_name,
        size,
        if is_public { "public" } else { "private" }
    );

    let resp = client
        .authenticated_multipart_post("/files/upload", form)
        .await
        .map_err(|e| match e {
            RequestError::Store(e) => ApiError::Store(e),
            RequestError::Transport(e) => ApiError::Upload(e.to_string()),
        })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let message = backend_message(resp).await;
        return Err(ApiError::Upload(format!("{} ({})", message, status.as_u16())));
    }

    let record: FileRecord = resp
        .json()
        .await
        .map_err(|e| ApiError::Upload(format!("Failed to parse upload response: {}", e)))?;
    record.validate().map_err(ApiError::Upload)?;
    Ok(record)
}

/// Fetch metadata for a single file.
///
/// GET /files/{id}/metadata. Public files resolve without a credential.
pub async fn get_file_metadata(client: &ApiClient, file_id: &str) -> Result<FileRecord, ApiError> {
    let path = format!("/files/{}/metadata", urlencoding::encode(file_id));
    let resp = client.authenticated_get(&path).await.map_err(remote)?;
    let status = resp.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::Remote(format!("file not found: {}", file_id)));
    }
    if is_auth_status(status) {
        return Err(ApiError::Auth(format!("access to {} denied ({})", file_id, status)));
    }
    if !status.is_success() {
        return Err(ApiError::Remote(backend_message(resp).await));
    }

    let record: FileRecord = resp
        .json()
        .await
        .map_err(|e| ApiError::Remote(format!("Failed to parse file metadata: {}", e)))?;
    record.validate().map_err(ApiError::Remote)?;
    Ok(record)
}

/// Link that renders an image or video inline.
pub fn preview_url(client: &ApiClient, file_id: &str, is_public: bool) -> String {
    file_url(client, file_id, "preview", is_public)
}

/// Link that serves the file as an attachment.
pub fn download_url(client: &ApiClient, file_id: &str, is_public: bool) -> String {
    file_url(client, file_id, "download", is_public)
}

/// Public page for a file on the share site: `<share_base>/file/{id}`.
pub fn share_link(share_base: &str, file_id: &str) -> String {
    format!(
        "{}/file/{}",
        share_base.trim_end_matches('/'),
        urlencoding::encode(file_id)
    )
}

fn file_url(client: &ApiClient, file_id: &str, action: &str, is_public: bool) -> String {
    let base = format!(
        "{}/files/{}/{}",
        client.base_url(),
        urlencoding::encode(file_id),
        action
    );
    if is_public {
        return base;
    }

    let api_key = client.stored_api_key().unwrap_or_else(|e| {
        log::warn!("Could not read stored API key for {} link: {}", action, e);
        None
    });
    match api_key {
        Some(key) => format!("{}?apiKey={}", base, urlencoding::encode(&key)),
        None => base,
    }
}
