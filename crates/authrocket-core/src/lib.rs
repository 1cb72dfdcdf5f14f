//! Client-side session helper for the AuthRocket authentication service.
//!
//! `AuthSession` wraps the remote register/login/verify/delete endpoints,
//! keeps the bearer token in a durable `TokenStore`, and publishes the
//! currently authenticated `User` through a watch channel.
//!
//! ```no_run
//! use std::sync::Arc;
//! use authrocket_core::{AuthConfig, AuthSession, ApiRequest, Credentials, MemoryTokenStore};
//!
//! # async fn run() -> Result<(), authrocket_core::AuthError> {
//! let config = AuthConfig::new("client-id", "client-secret", "https://auth.example.com")?;
//! let session = AuthSession::new(config, Arc::new(MemoryTokenStore::new()))?;
//!
//! session.login(&Credentials::new("alice", "p1")).await?;
//! let data: serde_json::Value = session
//!     .authenticated_request(ApiRequest::get("/some-protected-endpoint"))
//!     .await?;
//! session.logout();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, Method, StatusCode};
pub use auth::{
    AuthSession, FileTokenStore, KeyringTokenStore, MemoryTokenStore, StoreError, TokenStore,
    TokenVault, TOKEN_KEY,
};
pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use models::{Credentials, User};
