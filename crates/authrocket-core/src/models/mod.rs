//! Data models exchanged with the auth service.
//!
//! - `User`: the authenticated principal published by `AuthSession`
//! - `Credentials`: username/password pair passed to login and register
//! - Request/response bodies for the four auth endpoints

pub mod user;

pub use user::{Credentials, User};

pub(crate) use user::{LoginRequest, RegisterRequest, TokenResponse, VerifyRequest};
