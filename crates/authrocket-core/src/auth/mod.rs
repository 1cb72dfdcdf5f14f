//! Authentication module for managing the user session and its token.
//!
//! This module provides:
//! - `AuthSession`: login/register/verify/logout and the observable current user
//! - `TokenStore`: durable key-value storage for the bearer token
//! - `FileTokenStore`, `KeyringTokenStore`, `MemoryTokenStore`: store backends
//! - `TokenVault`: the token's single key, with a safe no-op fallback
//!
//! The token is the only durable state; the current user lives in memory.

pub mod credentials;
pub mod file;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use file::FileTokenStore;
pub use session::AuthSession;
pub use store::{MemoryTokenStore, StoreError, TokenStore, TokenVault, TOKEN_KEY};
