//! CLI configuration management.
//!
//! Non-secret settings (base URL, client id, last username, token store
//! backend) are stored at `~/.config/authrocket/config.json`. Environment
//! variables override the file. The client secret is only ever read from the
//! environment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use authrocket_core::{AuthConfig, FileTokenStore, KeyringTokenStore, TokenStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config directory paths
const APP_NAME: &str = "authrocket";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_BASE_URL: &str = "AUTHROCKET_BASE_URL";
const ENV_CLIENT_ID: &str = "AUTHROCKET_CLIENT_ID";
const ENV_TOKEN_STORE: &str = "AUTHROCKET_TOKEN_STORE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Keyring,
}

impl StoreKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Some(StoreKind::File),
            "keyring" | "keychain" => Some(StoreKind::Keyring),
            _ => None,
        }
    }
}

/// The token store the CLI was configured with
pub enum Store {
    File(Arc<FileTokenStore>),
    Keyring(Arc<KeyringTokenStore>),
}

impl Store {
    pub fn shared(&self) -> Arc<dyn TokenStore> {
        match self {
            Store::File(store) => store.clone() as Arc<dyn TokenStore>,
            Store::Keyring(store) => store.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub last_username: Option<String>,
    #[serde(default)]
    pub token_store: StoreKind,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Session config from the environment, falling back to this file for
    /// the base URL and client id.
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let lookup = |key: &str| {
            std::env::var(key).ok().or_else(|| match key {
                ENV_BASE_URL => self.base_url.clone(),
                ENV_CLIENT_ID => self.client_id.clone(),
                _ => None,
            })
        };
        AuthConfig::from_lookup(lookup).context(
            "Set AUTHROCKET_BASE_URL, AUTHROCKET_CLIENT_ID and AUTHROCKET_CLIENT_SECRET \
             (in the environment or a .env file)",
        )
    }

    pub fn store(&self) -> Result<Store> {
        let kind = match std::env::var(ENV_TOKEN_STORE) {
            Ok(raw) => StoreKind::parse(&raw)
                .ok_or_else(|| anyhow::anyhow!("Unknown {}: {}", ENV_TOKEN_STORE, raw))?,
            Err(_) => self.token_store,
        };

        if kind == StoreKind::Keyring {
            let keyring = KeyringTokenStore::default();
            if keyring.is_available() {
                return Ok(Store::Keyring(Arc::new(keyring)));
            }
            warn!("OS keychain unavailable, storing the token in a file instead");
        }

        let file_store = FileTokenStore::default_location()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(Store::File(Arc::new(file_store)))
    }
}
