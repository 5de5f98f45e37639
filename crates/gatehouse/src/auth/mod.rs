//! Authentication collaborator.
//!
//! Gatehouse never checks passwords itself. Once a submission passes the
//! guard it is handed to an [`Authenticator`], exactly once, with no retry.

mod client;

pub use client::HttpAuthenticator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credentials as typed into the login form
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Email address or username
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Request body for the authentication API.
///
/// An identifier containing `@` is sent as an email, anything else as a
/// username.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LoginPayload<'a> {
    Email { email: &'a str, password: &'a str },
    Username { username: &'a str, password: &'a str },
}

impl Credentials {
    pub fn payload(&self) -> LoginPayload<'_> {
        if self.identifier.contains('@') {
            LoginPayload::Email {
                email: &self.identifier,
                password: &self.password,
            }
        } else {
            LoginPayload::Username {
                username: &self.identifier,
                password: &self.password,
            }
        }
    }
}

/// A successful login as reported by the authentication API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Bearer token, if the API issued one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// User record, passed through untouched
    pub user: serde_json::Value,

    /// Profile record, if the API included one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<serde_json::Value>,
}

/// The authentication API refused the login, or could not be reached
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("authentication failed: {}", .message.as_deref().unwrap_or("no message"))]
pub struct AuthFailure {
    /// Message from the API, shown to the user verbatim when present
    pub message: Option<String>,
}

/// Checks credentials against the real authentication service
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedUser, AuthFailure>;
}

#[cfg(test)]
pub use fake::FakeAuthenticator;
