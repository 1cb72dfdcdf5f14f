//! API client for communicating with the auth service.
//!
//! This module provides the `ApiClient` struct for the four auth endpoints
//! and for caller-described requests that need a bearer token.

use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::AuthConfig;
use crate::models::{Credentials, LoginRequest, RegisterRequest, TokenResponse, User, VerifyRequest};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const REGISTER_PATH: &str = "/user/register/";
const LOGIN_PATH: &str = "/user/login/";
const VERIFY_TOKEN_PATH: &str = "/user/verify-token/";

/// `Client-ID`: the application's client identifier, sent on every request
const CLIENT_ID_HEADER: &str = "client-id";

/// `Client-Secret`: the application's client secret, sent on every request
const CLIENT_SECRET_HEADER: &str = "client-secret";

/// A request to be sent through `ApiClient::send`.
///
/// `path` is joined to the configured base URL unless it is already an
/// absolute `http(s)://` URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// API client for the auth service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl ApiClient {
    /// Create a new API client with the client identity headers preset
    pub fn new(config: &AuthConfig) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::HeaderName::from_static(CLIENT_ID_HEADER),
            Self::header_value(config.client_id())?,
        );
        let mut secret = Self::header_value(config.client_secret())?;
        secret.set_sensitive(true);
        headers.insert(header::HeaderName::from_static(CLIENT_SECRET_HEADER), secret);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            client_id: config.client_id().to_string(),
            client_secret: config.client_secret().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn header_value(value: &str) -> Result<header::HeaderValue, ApiError> {
        header::HeaderValue::from_str(value)
            .map_err(|_| ApiError::InvalidRequest("header value contains invalid characters".into()))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a JSON body. An empty body decodes as `null`.
    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("{} (from {})", e, url)))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        Self::decode(response, &url).await
    }

    // ===== Auth Endpoints =====

    /// Register a new account and return the issued token
    pub async fn register(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let body = RegisterRequest {
            credentials,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };
        let response: TokenResponse = self.post(REGISTER_PATH, &body).await?;
        Ok(response.token)
    }

    /// Log in and return the issued token
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let body = LoginRequest {
            credentials,
            app_id: &self.client_id,
        };
        let response: TokenResponse = self.post(LOGIN_PATH, &body).await?;
        Ok(response.token)
    }

    /// Ask the server who a token belongs to
    pub async fn verify_token(&self, token: &str) -> Result<User, ApiError> {
        self.post(VERIFY_TOKEN_PATH, &VerifyRequest { token }).await
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/user/delete/{}/", user_id));
        debug!(url = %url, "DELETE");

        let response = self.client.delete(&url).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Authenticated Requests =====

    /// Send a caller-described request with `Authorization: Bearer <token>`
    /// merged over the caller's headers.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest, bearer: &str) -> Result<T, ApiError> {
        let url = self.url(&request.path);

        let mut headers = header::HeaderMap::new();
        for (name, value) in &request.headers {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("invalid header name: {}", name)))?;
            headers.insert(name, Self::header_value(value)?);
        }
        let mut authorization = Self::header_value(&format!("Bearer {}", bearer))?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);

        debug!(method = %request.method, url = %url, "Authenticated request");

        let mut builder = self.client.request(request.method, &url).headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let response = Self::check_response(response).await?;
        Self::decode(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> ApiClient {
        let config = AuthConfig::new("cid", "csecret", server.url()).unwrap();
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let config = AuthConfig::new("cid", "csecret", "https://auth.example.com/").unwrap();
        let client = ApiClient::new(&config).unwrap();

        assert_eq!(client.url("/user/login/"), "https://auth.example.com/user/login/");
        assert_eq!(client.url("items"), "https://auth.example.com/items");
        assert_eq!(client.url("https://other.example.com/x"), "https://other.example.com/x");
    }

    #[test]
    fn test_new_rejects_unprintable_client_id() {
        let config = AuthConfig::new("bad\nid", "csecret", "https://auth.example.com").unwrap();
        assert!(matches!(ApiClient::new(&config), Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_register_sends_identity_headers_and_secret() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/user/register/")
            .match_header("client-id", "cid")
            .match_header("client-secret", "csecret")
            .match_header("content-type", Matcher::Regex("application/json".into()))
            .match_body(Matcher::Json(serde_json::json!({
                "username": "alice",
                "password": "p1",
                "client_id": "cid",
                "client_secret": "csecret",
            })))
            .with_status(201)
            .with_body(r#"{"token": "T1"}"#)
            .create_async()
            .await;

        let token = client_for(&server)
            .register(&Credentials::new("alice", "p1"))
            .await
            .unwrap();

        assert_eq!(token, "T1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_sends_app_id_without_secret() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/user/login/")
            .match_header("client-secret", "csecret")
            .match_body(Matcher::Json(serde_json::json!({
                "username": "alice",
                "password": "p1",
                "app_id": "cid",
            })))
            .with_body(r#"{"token": "T1"}"#)
            .create_async()
            .await;

        let token = client_for(&server)
            .login(&Credentials::new("alice", "p1"))
            .await
            .unwrap();

        assert_eq!(token, "T1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/user/verify-token/")
            .match_body(Matcher::Json(serde_json::json!({"token": "T1"})))
            .with_body(r#"{"username": "alice", "app": "app1"}"#)
            .create_async()
            .await;

        let user = client_for(&server).verify_token("T1").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.app, "app1");
    }

    #[tokio::test]
    async fn test_delete_user_accepts_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/user/delete/7/")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server).delete_user(7).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_mapped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/user/login/")
            .with_status(403)
            .with_body("inactive account")
            .create_async()
            .await;

        let err = client_for(&server)
            .login(&Credentials::new("alice", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(ref body) if body == "inactive account"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/user/login/")
            .with_body(r#"{"not_a_token": true}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .login(&Credentials::new("alice", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_send_merges_bearer_over_caller_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/notes/1")
            .match_header("authorization", "Bearer T1")
            .match_header("x-trace", "abc")
            .match_header("client-id", "cid")
            .match_query(Matcher::UrlEncoded("draft".into(), "true".into()))
            .match_body(Matcher::Json(serde_json::json!({"text": "hi"})))
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let request = ApiRequest::put("/notes/1")
            .header("X-Trace", "abc")
            .header("Authorization", "Bearer caller-supplied")
            .query("draft", "true")
            .json(serde_json::json!({"text": "hi"}));

        let body: serde_json::Value = client_for(&server).send(request, "T1").await.unwrap();
        assert_eq!(body, serde_json::json!({"ok": true}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_rejects_bad_header_name() {
        let server = mockito::Server::new_async().await;
        let request = ApiRequest::get("/x").header("bad header", "v");

        let result: Result<serde_json::Value, _> = client_for(&server).send(request, "T1").await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
