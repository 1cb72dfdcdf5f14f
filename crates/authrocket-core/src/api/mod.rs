//! HTTP client module for the auth service.
//!
//! This module provides the `ApiClient` for the register, login,
//! verify-token and delete-user endpoints, plus `ApiRequest` for arbitrary
//! calls that need a bearer token attached.
//!
//! Every request carries the `Client-ID` and `Client-Secret` headers set
//! once when the client is built.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiRequest};
pub use error::ApiError;
pub use reqwest::{Method, StatusCode};
