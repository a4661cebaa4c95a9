//! Request and response types for the Foglio backend API.
//!
//! All structs use camelCase serialization to match the API's JSON format.
//! Responses are checked with `validate()` after deserialization so a
//! structurally valid but empty payload is rejected at the client boundary.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// User returned by POST /users/register and GET /users/me.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    /// Bearer credential. Issued once at registration.
    pub api_key: String,
}

impl User {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("user response has an empty name".to_string());
        }
        if self.api_key.is_empty() {
            return Err("user response has an empty apiKey".to_string());
        }
        Ok(())
    }
}

/// Metadata for one uploaded file, as returned by the /files endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// UUID assigned by the backend.
    pub id: String,
    pub original_name: String,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: u64,
    #[serde(default)]
    pub owner_id: Option<u64>,
    pub is_public: bool,
    /// Name of the blob on the backend's disk.
    pub stored_file_name: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub request_count: u64,
    #[serde(default)]
    pub last_requested_at: Option<NaiveDateTime>,
}

impl FileRecord {
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("file record has an empty id".to_string());
        }
        Ok(())
    }

    /// The backend only serves previews for images and videos.
    pub fn is_previewable(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.starts_with("image/") || ct.starts_with("video/"))
            .unwrap_or(false)
    }

    pub fn visibility_label(&self) -> &'static str {
        if self.is_public {
            "public"
        } else {
            "private"
        }
    }
}

/// Format a byte count with 1024-based units, rounded to two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
