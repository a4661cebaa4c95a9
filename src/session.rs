//! Session context for the Foglio client.
//!
//! The single in-memory authority for "who is logged in", kept in step with
//! the durable credential store. A `Session` is created once at startup and
//! passed to every command; it is the only place that mutates session state.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use zeroize::Zeroize;

use crate::api::auth::CredentialStore;
use crate::api::client::ApiClient;
use crate::api::types::User;
use crate::api::{users, ApiError};

/// Where the session is in its login lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Startup, before the stored credential has been looked at.
    Unknown,
    /// A credential is being checked against the backend.
    Verifying,
    Authenticated(User),
    Unauthenticated,
}

impl SessionStatus {
    pub fn label(&self) -> &str {
        match self {
            SessionStatus::Unknown => "Unknown",
            SessionStatus::Verifying => "Verifying...",
            SessionStatus::Authenticated(_) => "Logged in",
            SessionStatus::Unauthenticated => "Not logged in",
        }
    }
}

pub struct Session {
    /// HTTP client for Foglio API communication.
    api: Arc<ApiClient>,

    /// Same store the API client reads from.
    store: Arc<dyn CredentialStore>,

    status: RwLock<SessionStatus>,

    /// Credential of the authenticated user (memory copy, zeroed on logout).
    api_key: RwLock<Option<String>>,

    /// `true` until the startup login attempt has finished.
    loading: watch::Sender<bool>,
}

impl Session {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let store = api.store().clone();
        let (loading, _) = watch::channel(true);
        Self {
            api,
            store,
            status: RwLock::new(SessionStatus::Unknown),
            api_key: RwLock::new(None),
            loading,
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub async fn status(&self) -> SessionStatus {
        self.status.read().await.clone()
    }

    #[cfg(test)]
    pub async fn current_user(&self) -> Option<User> {
        match &*self.status.read().await {
            SessionStatus::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    #[cfg(test)]
    pub async fn api_key(&self) -> Option<String> {
        self.api_key.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.status.read().await, SessionStatus::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Receiver that observes the loading flag flip to `false`.
    #[cfg(test)]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Wait until the startup login attempt has settled.
    pub async fn wait_until_loaded(&self) {
        let mut rx = self.loading.subscribe();
        // Only fails if the sender is gone, and `self` owns it
        let _ = rx.wait_for(|loading| !*loading).await;
    }

    /// Silent login from a previously stored credential.
    ///
    /// Runs at most once. Any failure leaves the session unauthenticated and
    /// is never returned to the caller. The loading flag clears when this
    /// finishes.
    pub async fn bootstrap(&self) {
        if !self.is_loading() {
            return;
        }

        let stored = match self.store.load() {
            Ok(key) => key.filter(|k| !k.is_empty()),
            Err(e) => {
                log::warn!("Failed to read stored API key: {}", e);
                None
            }
        };

        match stored {
            Some(key) => {
                log::info!("Stored API key found, verifying");
                if let Err(e) = self.login(&key).await {
                    log::warn!("Silent login failed: {}", e);
                }
            }
            None => {
                log::info!("No stored API key, starting logged out");
                *self.status.write().await = SessionStatus::Unauthenticated;
            }
        }

        self.loading.send_replace(false);
    }

    /// Start without looking at the stored credential, discarding it.
    ///
    /// For commands that replace the credential anyway. Ends the loading
    /// phase exactly like [`Session::bootstrap`]; later calls are no-ops.
    pub async fn start_discarding_stored(&self) {
        if !self.is_loading() {
            return;
        }
        self.clear_store();
        log::debug!("Stored API key discarded before replacement");
        *self.status.write().await = SessionStatus::Unauthenticated;
        self.loading.send_replace(false);
    }

    /// Persist `key` and resolve the user it belongs to.
    ///
    /// On failure the stored credential is removed and the session ends up
    /// unauthenticated; the error is returned.
    pub async fn login(&self, key: &str) -> Result<User, ApiError> {
        *self.status.write().await = SessionStatus::Verifying;

        let result = match self.store.store(key) {
            Ok(()) => users::get_current_user(&self.api).await,
            Err(e) => Err(ApiError::from(e)),
        };

        match result {
            Ok(user) => {
                *self.api_key.write().await = Some(key.to_string());
                log::info!("Logged in as {} (id {})", user.name, user.id);
                *self.status.write().await = SessionStatus::Authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.clear_store();
                self.reset().await;
                Err(e)
            }
        }
    }

    /// Forget the credential locally. No network call is made.
    pub async fn logout(&self) {
        self.clear_store();
        self.reset().await;
        log::info!("Logged out");
    }

    /// Register `name`, then log in with the issued key.
    ///
    /// The new user is returned even when the follow-up login fails, since
    /// the account exists and its key is only shown once.
    pub async fn register(&self, name: &str) -> Result<User, ApiError> {
        let user = users::register(&self.api, name).await?;
        log::info!("Registered user {} (id {})", user.name, user.id);

        if let Err(e) = self.login(&user.api_key).await {
            log::warn!("Login after registration failed: {}", e);
        }
        Ok(user)
    }

    async fn reset(&self) {
        {
            let mut key = self.api_key.write().await;
            if let Some(ref mut k) = *key {
                k.zeroize();
            }
            *key = None;
        }
        *self.status.write().await = SessionStatus::Unauthenticated;
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear stored API key: {}", e);
        }
    }
}
