//! CLI subcommands: the user-facing views of the Foglio client.
//!
//! Each command renders session or file state to stdout and drives the
//! session / API operations. Errors come back as display strings; `main`
//! prints them and sets the exit code.

use std::fmt::Write as _;
use std::path::Path;

use crate::api::files::{self, FileUpload};
use crate::api::types::{format_file_size, FileRecord, User};
use crate::api::ApiError;
use crate::session::{Session, SessionStatus};

/// Which link to build for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Preview,
    Download,
}

/// How the session is prepared before a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Silent login with the stored credential, if any.
    Resume,
    /// Drop the stored credential unverified; the command sets or clears it.
    Replace,
}

/// Prepare `session` for a command. Must run once, before the command.
pub async fn start_session(session: &Session, startup: Startup) {
    match startup {
        Startup::Resume => session.bootstrap().await,
        Startup::Replace => session.start_discarding_stored().await,
    }
}

/// Register a new account and log in with the issued key.
pub async fn register(session: &Session, name: &str) -> Result<String, String> {
    let user = session.register(name).await.map_err(describe)?;

    let mut out = String::new();
    let _ = writeln!(out, "Registered {} (id {})", user.name, user.id);
    let _ = writeln!(out, "API key: {}", user.api_key);
    let _ = writeln!(out, "Save this key now; it cannot be retrieved again.");
    if !session.is_authenticated().await {
        let _ = writeln!(out, "Automatic login failed; run `foglio login <API_KEY>`.");
    }
    Ok(out)
}

pub async fn login(session: &Session, api_key: &str) -> Result<String, String> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err("API key must not be empty".to_string());
    }
    let user = session
        .login(key)
        .await
        .map_err(|e| format!("Invalid API key: {}", e))?;
    Ok(format!("Logged in as {} (id {})\n", user.name, user.id))
}

pub async fn logout(session: &Session) -> Result<String, String> {
    session.logout().await;
    Ok("Logged out\n".to_string())
}

pub async fn whoami(session: &Session) -> Result<String, String> {
    let user = require_user(session).await?;
    Ok(render_user(&user))
}

pub async fn list_files(session: &Session, share_url: &str) -> Result<String, String> {
    let user = require_user(session).await?;
    let records = files::list_own_files(session.api())
        .await
        .map_err(describe)?;

    let mut out = format!("Files of {}\n", user.name);
    if records.is_empty() {
        out.push_str("No files yet. Upload one with `foglio upload <PATH>`.\n");
        return Ok(out);
    }
    for record in &records {
        out.push_str(&render_file(session, record, share_url));
    }
    Ok(out)
}

pub async fn upload(
    session: &Session,
    path: &Path,
    is_public: bool,
    share_url: &str,
) -> Result<String, String> {
    require_user(session).await?;
    let upload = FileUpload::from_path(path).await.map_err(describe)?;
    let record = files::upload_file(session.api(), upload, is_public)
        .await
        .map_err(describe)?;

    let mut out = String::from("Uploaded\n");
    out.push_str(&render_file(session, &record, share_url));
    Ok(out)
}

pub async fn info(session: &Session, file_id: &str, share_url: &str) -> Result<String, String> {
    session.wait_until_loaded().await;
    let record = files::get_file_metadata(session.api(), file_id)
        .await
        .map_err(describe)?;
    Ok(render_file(session, &record, share_url))
}

/// Build a preview or download link without contacting the backend.
pub async fn link(
    session: &Session,
    file_id: &str,
    kind: LinkKind,
    is_public: bool,
) -> Result<String, String> {
    session.wait_until_loaded().await;
    let url = match kind {
        LinkKind::Preview => files::preview_url(session.api(), file_id, is_public),
        LinkKind::Download => files::download_url(session.api(), file_id, is_public),
    };
    Ok(format!("{}\n", url))
}

/// Print the public share page link. Only public files can be shared.
pub async fn share(session: &Session, file_id: &str, share_url: &str) -> Result<String, String> {
    session.wait_until_loaded().await;
    let record = files::get_file_metadata(session.api(), file_id)
        .await
        .map_err(describe)?;
    if !record.is_public {
        return Err(format!(
            "{} is private; only public files have share links",
            record.original_name
        ));
    }
    Ok(format!("{}\n", files::share_link(share_url, &record.id)))
}

/// Wait for the startup login to settle, then require an authenticated user.
async fn require_user(session: &Session) -> Result<User, String> {
    session.wait_until_loaded().await;
    match session.status().await {
        SessionStatus::Authenticated(user) => Ok(user),
        other => Err(format!(
            "{}. Run `foglio login <API_KEY>` or `foglio register <NAME>`.",
            other.label()
        )),
    }
}

fn describe(err: ApiError) -> String {
    if err.is_auth() {
        format!("{}. Log in again with `foglio login <API_KEY>`.", err)
    } else {
        err.to_string()
    }
}

fn render_user(user: &User) -> String {
    format!("{} (id {})\n", user.name, user.id)
}

fn render_file(session: &Session, record: &FileRecord, share_url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}  [{}]",
        record.original_name,
        format_file_size(record.size),
        record.visibility_label()
    );
    let _ = writeln!(out, "  id:        {}", record.id);
    if let Some(ct) = &record.content_type {
        let _ = writeln!(out, "  type:      {}", ct);
    }
    if let Some(created) = record.created_at {
        let _ = writeln!(out, "  uploaded:  {}", created.format("%Y-%m-%d %H:%M"));
    }
    let _ = writeln!(out, "  requests:  {}", record.request_count);
    if record.is_previewable() {
        let _ = writeln!(
            out,
            "  preview:   {}",
            files::preview_url(session.api(), &record.id, record.is_public)
        );
    }
    let _ = writeln!(
        out,
        "  download:  {}",
        files::download_url(session.api(), &record.id, record.is_public)
    );
    if record.is_public {
        let _ = writeln!(out, "  share:     {}", files::share_link(share_url, &record.id));
    }
    out
}
