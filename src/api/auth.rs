//! Durable storage for the API credential.
//!
//! Exactly one credential is stored, under a fixed key. A missing entry means
//! the user is logged out. The keychain backend uses the `keyring` crate; the
//! file backend keeps the key in the user config directory for hosts without
//! a usable secret service.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;

/// Keychain service name for the Foglio client.
const SERVICE_NAME: &str = "me.foglio.cli";

/// Fixed key the credential is stored under, in every backend.
pub const API_KEY_ENTRY: &str = "apiKey";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Credential store operation failed: {0}")]
    OperationFailed(String),
}

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::OperationFailed(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::OperationFailed(err.to_string())
    }
}

/// Durable key/value slot holding the current credential.
pub trait CredentialStore: Send + Sync {
    /// Returns `None` if no credential is stored.
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn store(&self, api_key: &str) -> Result<(), StoreError>;

    /// Idempotent: clearing an empty store succeeds.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Credential stored in the OS keychain.
pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, API_KEY_ENTRY)?)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeychainStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    fn store(&self, api_key: &str) -> Result<(), StoreError> {
        self.entry()?.set_password(api_key)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::from(e)),
        }
    }
}

/// Credential stored as a single file, `<dir>/apiKey`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store rooted in the platform config directory (`~/.config/foglio` on Linux).
    pub fn in_config_dir() -> Result<Self, StoreError> {
        let dir = dirs::config_dir()
            .ok_or_else(|| StoreError::OperationFailed("no config directory".to_string()))?;
        Ok(Self::in_dir(dir.join("foglio")))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self {
            path: dir.join(API_KEY_ENTRY),
        }
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let key = contents.trim();
                if key.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(key.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    fn store(&self, api_key: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, api_key)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from(e)),
        }
    }
}

/// Process-lifetime store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_key(api_key: &str) -> Self {
        Self {
            slot: Mutex::new(Some(api_key.to_string())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StoreError> {
        self.slot
            .lock()
            .map_err(|_| StoreError::OperationFailed("memory store poisoned".to_string()))
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn store(&self, api_key: &str) -> Result<(), StoreError> {
        *self.lock()? = Some(api_key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.store("K1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("K1"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = FileStore::in_dir(dir.path().join("foglio"));
        assert_eq!(first.load().unwrap(), None);
        first.store("secret-key").unwrap();

        let second = FileStore::in_dir(dir.path().join("foglio"));
        assert_eq!(second.load().unwrap().as_deref(), Some("secret-key"));

        second.clear().unwrap();
        assert_eq!(first.load().unwrap(), None);
        assert!(!dir.path().join("foglio").join(API_KEY_ENTRY).exists());
    }

    #[test]
    fn test_file_store_treats_blank_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(API_KEY_ENTRY), "  \n").unwrap();

        let store = FileStore::in_dir(dir.path().to_path_buf());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path().to_path_buf());
        store.clear().unwrap();
        store.clear().unwrap();
    }
}
