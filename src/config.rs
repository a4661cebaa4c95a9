//! Runtime configuration: backend URL, share site URL, credential backend.
//!
//! Resolution order for each value is CLI flag, then environment (after
//! `.env` has been loaded by `main`), then the built-in default.

use std::str::FromStr;
use std::sync::Arc;

use crate::api::auth::{CredentialStore, FileStore, KeychainStore, MemoryStore, StoreError};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Which durable store holds the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Keychain,
    File,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" | "keyring" => Ok(StoreKind::Keychain),
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!(
                "unknown credential store '{}' (expected keychain, file or memory)",
                other
            )),
        }
    }
}

impl StoreKind {
    pub fn open(self) -> Result<Arc<dyn CredentialStore>, StoreError> {
        let store: Arc<dyn CredentialStore> = match self {
            StoreKind::Keychain => Arc::new(KeychainStore::new()),
            StoreKind::File => Arc::new(FileStore::in_config_dir()?),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    /// Base of the public share pages (`<share_url>/file/{id}`).
    pub share_url: String,
    pub store: StoreKind,
}

/// Values given on the command line. `None` defers to the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub share_url: Option<String>,
    pub store: Option<String>,
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self, String> {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    fn resolve(overrides: Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        // FOGLIO_API_URL > NEXT_PUBLIC_API_URL > localhost default
        let api_url = overrides
            .api_url
            .or_else(|| env("FOGLIO_API_URL"))
            .or_else(|| env("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = normalize_url(&api_url)?;

        let share_url = match overrides.share_url.or_else(|| env("FOGLIO_SHARE_URL")) {
            Some(url) => normalize_url(&url)?,
            None => api_url.clone(),
        };

        let store = match overrides.store.or_else(|| env("FOGLIO_CREDENTIAL_STORE")) {
            Some(kind) => kind.parse()?,
            None => StoreKind::default(),
        };

        Ok(Self {
            api_url,
            share_url,
            store,
        })
    }
}

fn normalize_url(url: &str) -> Result<String, String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!("invalid URL '{}': must start with http:// or https://", url));
    }
    Ok(trimmed.to_string())
}
