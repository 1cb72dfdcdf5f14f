use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Errors surfaced by `AuthSession`.
///
/// The `*Failed` variants wrap the transport error that caused them so the
/// status and body stay available through `source()`. `Request` is the
/// unwrapped error of an authenticated call.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Registration failed: {0}")]
    RegistrationFailed(#[source] ApiError),

    #[error("Login failed: {0}")]
    LoginFailed(#[source] ApiError),

    #[error("Token verification failed: {0}")]
    VerificationFailed(#[source] ApiError),

    #[error("User deletion failed: {0}")]
    DeletionFailed(#[source] ApiError),

    #[error("User is not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Request(ApiError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] ApiError),
}

impl AuthError {
    /// The underlying transport error, if this error came from the network.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            AuthError::RegistrationFailed(e)
            | AuthError::LoginFailed(e)
            | AuthError::VerificationFailed(e)
            | AuthError::DeletionFailed(e)
            | AuthError::Request(e)
            | AuthError::Client(e) => Some(e),
            AuthError::NotAuthenticated | AuthError::Config(_) => None,
        }
    }

    pub fn status(&self) -> Option<reqwest::StatusCode> {
        self.api_error().and_then(ApiError::status)
    }
}
