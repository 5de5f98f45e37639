//! HTTP client for the portfolio REST API login endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use gatehouse_common::constants::AUTH_LOGIN_PATH;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

use super::{AuthFailure, AuthenticatedUser, Authenticator, Credentials};

/// Success body. Older API versions say `access_token`, newer ones `token`.
#[derive(Debug, Deserialize)]
struct LoginResponseBody {
    token: Option<String>,
    access_token: Option<String>,
    #[serde(default)]
    user: serde_json::Value,
    profile: Option<serde_json::Value>,
}

/// Error body (Laravel style)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl From<LoginResponseBody> for AuthenticatedUser {
    fn from(body: LoginResponseBody) -> Self {
        // Resource-wrapped profiles arrive as {"data": {...}}
        let profile = match body.profile {
            Some(serde_json::Value::Object(mut map)) if map.contains_key("data") => {
                map.remove("data")
            }
            Some(serde_json::Value::Null) | None => None,
            other => other,
        };

        Self {
            token: body.token.or(body.access_token),
            user: body.user,
            profile,
        }
    }
}

/// Authenticator that calls `POST {base_url}/auth/login`
pub struct HttpAuthenticator {
    client: reqwest::Client,
    login_url: String,
}

impl HttpAuthenticator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let login_url = format!("{}{}", base_url.trim_end_matches('/'), AUTH_LOGIN_PATH);

        Ok(Self { client, login_url })
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedUser, AuthFailure> {
        let response = self
            .client
            .post(&self.login_url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&credentials.payload())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %self.login_url, error = %e, "Authentication API unreachable");
                AuthFailure::default()
            })?;

        let status = response.status();
        if status.is_success() {
            let body: LoginResponseBody = response.json().await.map_err(|e| {
                tracing::warn!(error = %e, "Malformed login response from authentication API");
                AuthFailure::default()
            })?;
            return Ok(body.into());
        }

        // Error bodies are best effort; a missing message falls back to the default text
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);

        tracing::debug!(status = status.as_u16(), "Authentication API rejected login");

        Err(AuthFailure { message })
    }
}
