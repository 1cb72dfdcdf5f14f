use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::{StoreError, TokenStore};

/// Application name used for the default store directory
const APP_NAME: &str = "authrocket";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    stored_at: DateTime<Utc>,
}

/// Token store backed by one JSON file per key in a directory.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform cache directory, e.g. `~/.cache/authrocket`.
    /// `None` when the platform has no cache directory.
    pub fn default_location() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::new(dir.join(APP_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// When the value under `key` was written
    pub fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.read_entry(key)?.map(|e| e.stored_at))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read_entry(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    #[cfg(unix)]
    fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn is_available(&self) -> bool {
        std::fs::create_dir_all(&self.dir).is_ok()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entry(key)?.map(|e| e.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = StoredEntry {
            value: value.to_string(),
            stored_at: Utc::now(),
        };
        let path = self.entry_path(key);
        std::fs::write(&path, serde_json::to_string_pretty(&entry)?)?;
        Self::restrict_permissions(&path)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
