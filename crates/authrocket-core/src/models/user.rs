use std::fmt;

use serde::{Deserialize, Serialize};

/// The authenticated principal as reported by the verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    /// Application tag the token was issued for
    pub app: String,
}

impl User {
    pub fn display_name(&self) -> String {
        match self.id {
            Some(id) => format!("{} (#{}) @ {}", self.username, id, self.app),
            None => format!("{} @ {}", self.username, self.app),
        }
    }
}

/// Username/password pair. Only borrowed by the session, never kept.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ===== Wire types =====

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    #[serde(flatten)]
    pub credentials: &'a Credentials,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Login identifies the application by `app_id` and does not carry the secret.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(flatten)]
    pub credentials: &'a Credentials,
    pub app_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verify_response_without_id() {
        let json = r#"{"username": "alice", "app": "app1"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse verify test JSON");
        assert_eq!(user.id, None);
        assert_eq!(user.username, "alice");
        assert_eq!(user.app, "app1");
        assert_eq!(user.display_name(), "alice @ app1");
    }

    #[test]
    fn test_parse_verify_response_with_id_and_extra_fields() {
        let json = r#"{"id": 42, "username": "bob", "app": "app1", "email": "bob@example.com"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse verify test JSON");
        assert_eq!(user.id, Some(42));
        assert_eq!(user.display_name(), "bob (#42) @ app1");
    }

    #[test]
    fn test_register_body_carries_both_secrets() {
        let creds = Credentials::new("alice", "p1");
        let body = serde_json::to_value(RegisterRequest {
            credentials: &creds,
            client_id: "cid",
            client_secret: "csecret",
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "username": "alice",
                "password": "p1",
                "client_id": "cid",
                "client_secret": "csecret",
            })
        );
    }

    #[test]
    fn test_login_body_omits_secret() {
        let creds = Credentials::new("alice", "p1");
        let body = serde_json::to_value(LoginRequest {
            credentials: &creds,
            app_id: "cid",
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"username": "alice", "password": "p1", "app_id": "cid"})
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
