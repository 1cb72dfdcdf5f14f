use std::sync::OnceLock;

use keyring::Entry;
use tracing::debug;

use super::store::{StoreError, TokenStore};

/// Default keychain service name
pub const DEFAULT_SERVICE_NAME: &str = "authrocket";

/// Entry written and read back once to check the keychain actually persists
const PROBE_KEY: &str = "authrocket-availability-check";

/// Token store backed by the OS keychain.
pub struct KeyringTokenStore {
    service: String,
    available: OnceLock<bool>,
}

impl KeyringTokenStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            available: OnceLock::new(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }

    /// Write a value through one entry and read it through another. A
    /// keychain that cannot hold a value across entries is not usable.
    fn check_round_trip(&self) -> Result<bool, StoreError> {
        self.entry(PROBE_KEY)?.set_password("ok")?;
        let read_back = self.entry(PROBE_KEY)?.get_password();
        let _ = self.entry(PROBE_KEY)?.delete_credential();
        Ok(matches!(read_back, Ok(ref value) if value == "ok"))
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl TokenStore for KeyringTokenStore {
    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| match self.check_round_trip() {
            Ok(available) => available,
            Err(e) => {
                debug!(error = %e, service = %self.service, "Keychain unavailable");
                false
            }
        })
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
