//! HTTP client with credential header injection.
//!
//! The credential is read from the [`CredentialStore`] every time a request is
//! built and attached as `X-API-KEY`. The client itself never caches it, so a
//! login or logout through the store takes effect on the next request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use super::auth::{CredentialStore, StoreError};

/// Header the backend reads the credential from.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// HTTP client wrapper for Foglio API communication.
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// Create a new API client with the given base URL and credential store.
    pub fn new(base_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Current stored credential. Empty strings count as absent.
    pub fn stored_api_key(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.load()?.filter(|k| !k.is_empty()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_api_key(&self, builder: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        match self.stored_api_key()? {
            Some(key) => Ok(builder.header(API_KEY_HEADER, key)),
            None => Ok(builder),
        }
    }

    /// Send an authenticated GET request to a relative API path.
    pub async fn authenticated_get(&self, path: &str) -> Result<Response, RequestError> {
        log::debug!("GET {}", path);
        let builder = self.with_api_key(self.client.get(self.url(path)))?;
        Ok(builder.send().await?)
    }

    /// Send an unauthenticated POST request with no body.
    /// Used for registration, where no credential exists yet.
    pub async fn post(&self, path: &str) -> Result<Response, RequestError> {
        log::debug!("POST {}", path);
        Ok(self.client.post(self.url(path)).send().await?)
    }

    /// Send an authenticated multipart POST request (used for file uploads).
    pub async fn authenticated_multipart_post(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Response, RequestError> {
        log::debug!("POST {} (multipart)", path);
        let builder = self.with_api_key(self.client.post(self.url(path)).multipart(form))?;
        Ok(builder.send().await?)
    }
}

/// Failure before a response was received.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::MemoryStore;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8080/", Arc::new(MemoryStore::new()));
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/files"), "http://localhost:8080/files");
    }

    #[test]
    fn test_stored_api_key_reads_store_each_time() {
        let store = Arc::new(MemoryStore::new());
        let client = ApiClient::new("http://localhost:8080", store.clone());
        assert_eq!(client.stored_api_key().unwrap(), None);

        store.store("K1").unwrap();
        assert_eq!(client.stored_api_key().unwrap().as_deref(), Some("K1"));

        store.store("").unwrap();
        assert_eq!(client.stored_api_key().unwrap(), None);
    }
}
