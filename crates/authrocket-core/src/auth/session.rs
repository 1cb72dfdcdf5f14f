//! The client-side auth session.
//!
//! `AuthSession` owns three things: the HTTP client (with the application's
//! client identity), the durable bearer token (through a `TokenVault`), and
//! the current-user slot (a `watch` channel). A session is Authenticated
//! while the slot holds a `User` and Unauthenticated otherwise.
//!
//! The token and the user are always cleared together. Register and login
//! persist the new token first and then verify it; if verification fails
//! the token is removed again, so a failed adoption leaves neither behind.

use std::sync::Arc;

use futures::Stream;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::models::{Credentials, User};

use super::store::{TokenStore, TokenVault};

/// Client-side session against the auth service.
/// Clone is cheap; clones share the token store and the current-user slot.
#[derive(Clone)]
pub struct AuthSession {
    client: ApiClient,
    vault: TokenVault,
    user_tx: Arc<watch::Sender<Option<User>>>,
}

impl AuthSession {
    pub fn new(config: AuthConfig, store: Arc<dyn TokenStore>) -> Result<Self, AuthError> {
        let client = ApiClient::new(&config).map_err(AuthError::Client)?;
        let (user_tx, _) = watch::channel(None);

        Ok(Self {
            client,
            vault: TokenVault::new(store),
            user_tx: Arc::new(user_tx),
        })
    }

    /// Register a new account, adopt the issued token and return it.
    ///
    /// If the new token then fails verification, the token is discarded and
    /// this returns `RegistrationFailed` rather than a token for a session
    /// that never started.
    pub async fn register(&self, credentials: &Credentials) -> Result<String, AuthError> {
        let token = self
            .client
            .register(credentials)
            .await
            .map_err(AuthError::RegistrationFailed)?;
        self.adopt_token(&token)
            .await
            .map_err(AuthError::RegistrationFailed)?;

        info!(username = %credentials.username, "Registered new account");
        Ok(token)
    }

    /// Log in, adopt the issued token and return it.
    ///
    /// If the new token then fails verification, the token is discarded and
    /// this returns `LoginFailed` rather than a token for a session that
    /// never started.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, AuthError> {
        let token = self
            .client
            .login(credentials)
            .await
            .map_err(AuthError::LoginFailed)?;
        self.adopt_token(&token)
            .await
            .map_err(AuthError::LoginFailed)?;

        info!(username = %credentials.username, "Logged in");
        Ok(token)
    }

    /// Verify a token and publish the user it belongs to.
    ///
    /// On failure the current user becomes `None`. The stored token is left
    /// alone; whether to discard it is the caller's decision.
    pub async fn verify_token(&self, token: &str) -> Result<User, AuthError> {
        self.check_token(token)
            .await
            .map_err(AuthError::VerificationFailed)
    }

    /// Delete an account. Ends the session only if the server accepted it.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), AuthError> {
        self.client
            .delete_user(user_id)
            .await
            .map_err(AuthError::DeletionFailed)?;

        info!(user_id, "Deleted user");
        self.clear_session();
        Ok(())
    }

    pub fn logout(&self) {
        self.clear_session();
        info!("Logged out");
    }

    /// Watch the current user.
    ///
    /// `borrow()` on the receiver gives the latest value right away and
    /// `changed()` resolves on every later update.
    pub fn get_user(&self) -> watch::Receiver<Option<User>> {
        self.user_tx.subscribe()
    }

    /// The current user as a stream: the latest value first, then each change.
    pub fn user_stream(&self) -> impl Stream<Item = Option<User>> + Send + 'static {
        let rx = self.user_tx.subscribe();
        futures::stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let user = rx.borrow_and_update().clone();
            Some((user, (rx, false)))
        })
    }

    pub fn current_user(&self) -> Option<User> {
        self.user_tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_tx.borrow().is_some()
    }

    /// The stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.vault.load()
    }

    /// Pick up a token stored by an earlier process.
    ///
    /// Returns `Ok(None)` when nothing is stored. A token the server rejects
    /// with a 4xx is discarded; on network or server errors it is kept so a
    /// later `resume` can retry.
    pub async fn resume(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.vault.load() else {
            debug!("No stored token to resume");
            return Ok(None);
        };

        match self.check_token(&token).await {
            Ok(user) => {
                info!(username = %user.username, "Resumed session");
                Ok(Some(user))
            }
            Err(e) => {
                if e.status().is_some_and(|s| s.is_client_error()) {
                    warn!(error = %e, "Stored token rejected, discarding it");
                    self.clear_session();
                }
                Err(AuthError::VerificationFailed(e))
            }
        }
    }

    /// Send a request with the session's bearer token.
    ///
    /// Fails with `NotAuthenticated`, without touching the network, when no
    /// user is signed in. A 401 ends the session before the error is
    /// returned; any other error leaves the session as it was.
    pub async fn authenticated_request<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }

        let Some(token) = self.vault.load() else {
            warn!("Signed-in user has no stored token, ending session");
            self.clear_session();
            return Err(AuthError::NotAuthenticated);
        };

        match self.client.send(request, &token).await {
            Ok(body) => Ok(body),
            Err(e) if e.is_unauthorized() => {
                warn!("Token rejected by server, ending session");
                self.clear_session();
                Err(AuthError::Request(e))
            }
            Err(e) => Err(AuthError::Request(e)),
        }
    }

    // ===== Internals =====

    /// Persist-then-verify. On failure neither token nor user remains.
    async fn adopt_token(&self, token: &str) -> Result<User, ApiError> {
        self.vault.save(token);

        match self.check_token(token).await {
            Ok(user) => Ok(user),
            Err(e) => {
                warn!(error = %e, "New token failed verification, discarding it");
                self.clear_session();
                Err(e)
            }
        }
    }

    async fn check_token(&self, token: &str) -> Result<User, ApiError> {
        match self.client.verify_token(token).await {
            Ok(user) => {
                debug!(username = %user.username, app = %user.app, "Token verified");
                self.user_tx.send_replace(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.clear_user();
                Err(e)
            }
        }
    }

    fn clear_user(&self) {
        // Only notify watchers on an actual change, so repeated logouts are silent
        self.user_tx.send_if_modified(|current| current.take().is_some());
    }

    fn clear_session(&self) {
        self.clear_user();
        self.vault.clear();
    }
}
