use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

/// Key the bearer token is stored under
pub const TOKEN_KEY: &str = "authToken";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token store unavailable: {0}")]
    Unavailable(String),

    #[error("Token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt token store entry: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Durable key-value storage for session data.
///
/// Callers check `is_available` before use; an unavailable store is skipped
/// rather than treated as an error.
pub trait TokenStore: Send + Sync {
    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a key that is not present succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// The bearer token's slot in a `TokenStore`.
///
/// Store failures never reach the session: an unavailable store is skipped
/// and a failing one is logged and treated as empty.
#[derive(Clone)]
pub struct TokenVault {
    store: Arc<dyn TokenStore>,
}

impl TokenVault {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Option<String> {
        if !self.store.is_available() {
            debug!("Token store unavailable, no token to load");
            return None;
        }
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token from store");
                None
            }
        }
    }

    pub fn save(&self, token: &str) {
        if !self.store.is_available() {
            debug!("Token store unavailable, token not persisted");
            return;
        }
        if let Err(e) = self.store.set(TOKEN_KEY, token) {
            warn!(error = %e, "Failed to persist token");
        }
    }

    pub fn clear(&self) {
        if !self.store.is_available() {
            return;
        }
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to remove token from store");
        }
    }
}
