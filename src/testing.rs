//! In-process fake of the Foglio backend for tests.
//!
//! Serves the subset of the REST surface the client consumes on an
//! ephemeral localhost port and records the credential header of every
//! request it sees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::api::client::API_KEY_HEADER;
use crate::api::types::{FileRecord, User};

#[derive(Default)]
pub struct FakeState {
    pub users: Mutex<Vec<User>>,
    pub files: Mutex<Vec<FileRecord>>,
    /// `X-API-KEY` value of each request, in arrival order.
    pub seen_keys: Mutex<Vec<Option<String>>>,
    pub requests: AtomicUsize,
    /// Serve `/users/me` with a body missing required fields.
    pub malformed_me: AtomicBool,
    /// Reject every upload with a 500.
    pub fail_uploads: AtomicBool,
}

impl FakeState {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn seen_keys(&self) -> Vec<Option<String>> {
        self.seen_keys.lock().unwrap().clone()
    }

    /// Insert a user directly, bypassing the register endpoint.
    pub fn seed_user(&self, name: &str, api_key: &str) -> User {
        let mut users = self.users.lock().unwrap();
        let user = User {
            id: users.len() as u64 + 1,
            name: name.to_string(),
            api_key: api_key.to_string(),
        };
        users.push(user.clone());
        user
    }

    fn record(&self, headers: &HeaderMap) -> Option<User> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen_keys.lock().unwrap().push(key.clone());

        let key = key?;
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.api_key == key)
            .cloned()
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/users/register", post(register))
            .route("/users/me", get(me))
            .route("/files", get(list_files))
            .route("/files/upload", post(upload))
            .route("/files/{id}/metadata", get(metadata))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or(""),
            "message": message,
        })),
    )
        .into_response()
}

async fn register(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record(&headers);
    let name = params.get("name").map(|n| n.trim().to_string()).unwrap_or_default();
    if name.is_empty() {
        return error(StatusCode::BAD_REQUEST, "name is required");
    }
    if state.users.lock().unwrap().iter().any(|u| u.name == name) {
        return error(StatusCode::CONFLICT, "name already taken");
    }
    let id = state.users.lock().unwrap().len() as u64 + 1;
    let user = state.seed_user(&name, &format!("K{}", id));
    Json(user).into_response()
}

async fn me(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let Some(user) = state.record(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if state.malformed_me.load(Ordering::SeqCst) {
        return Json(json!({ "id": user.id })).into_response();
    }
    Json(user).into_response()
}

async fn list_files(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let Some(user) = state.record(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let files: Vec<FileRecord> = state
        .files
        .lock()
        .unwrap()
        .iter()
        .filter(|f| f.owner_id == Some(user.id))
        .cloned()
        .collect();
    Json(files).into_response()
}

async fn upload(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let Some(user) = state.record(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    if state.fail_uploads.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "disk full");
    }

    let mut file: Option<(String, Option<String>, usize)> = None;
    let mut is_public = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("blob").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.unwrap_or_default();
                file = Some((name, content_type, bytes.len()));
            }
            "public" => {
                is_public = field.text().await.unwrap_or_default() == "true";
            }
            _ => {}
        }
    }

    let Some((name, content_type, size)) = file else {
        return error(StatusCode::BAD_REQUEST, "file is required");
    };

    let index = state.files.lock().unwrap().len() + 1;
    let id = format!("00000000-0000-0000-0000-{:012}", index);
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_string());
    let record = FileRecord {
        stored_file_name: match &extension {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.clone(),
        },
        id,
        original_name: name,
        extension,
        content_type,
        size: size as u64,
        owner_id: Some(user.id),
        is_public,
        created_at: None,
        request_count: 0,
        last_requested_at: None,
    };
    state.files.lock().unwrap().push(record.clone());
    Json(record).into_response()
}

async fn metadata(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let user = state.record(&headers);
    let Some(record) = state.files.lock().unwrap().iter().find(|f| f.id == id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !record.is_public {
        match user {
            None => return StatusCode::UNAUTHORIZED.into_response(),
            Some(u) if record.owner_id != Some(u.id) => return StatusCode::FORBIDDEN.into_response(),
            Some(_) => {}
        }
    }
    Json(record).into_response()
}
