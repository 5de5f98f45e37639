//! HTTP route handlers for Gatehouse.

use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use gatehouse_common::{GatehouseError, LoginStatus};
use serde::Serialize;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

mod health;
mod login;

/// Headroom on top of the authentication timeout for the whole request
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.config.auth.timeout() + REQUEST_TIMEOUT_MARGIN;

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/metrics", get(health::metrics))

        // Login views
        .route("/sessions", post(login::open_session))
        .route(
            "/sessions/{session_id}",
            get(login::get_session).delete(login::close_session),
        )
        .route("/sessions/{session_id}/login", post(login::submit_login))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))

        // Event streams run for the whole cooldown, so no request timeout
        .route("/sessions/{session_id}/countdown", get(login::stream_countdown))

        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // The admin panel is served from another origin and sends cookies
                .layer(CorsLayer::very_permissive()),
        )

        // Add shared state
        .with_state(state)
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<LoginStatus>,
}

/// A [`GatehouseError`] rendered as JSON
#[derive(Debug)]
pub struct ApiError {
    error: GatehouseError,
    status: Option<LoginStatus>,
}

impl ApiError {
    /// Attach the view snapshot.
    ///
    /// Dropped for `login_failed` errors: a honeypot hit leaves the counter
    /// alone, and the snapshot would show it.
    pub fn with_status(mut self, status: LoginStatus) -> Self {
        if self.error.kind() != "login_failed" {
            self.status = Some(status);
        }
        self
    }
}

impl From<GatehouseError> for ApiError {
    fn from(error: GatehouseError) -> Self {
        Self { error, status: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let remaining_seconds = match self.error {
            GatehouseError::CooldownActive { remaining_seconds } => Some(remaining_seconds),
            _ => None,
        };

        if code.is_server_error() {
            tracing::error!(error = %self.error, "Request failed");
        }

        let body = ErrorBody {
            error: self.error.kind(),
            message: self.error.to_string(),
            remaining_seconds,
            status: self.status,
        };

        let mut response = (code, Json(body)).into_response();
        if let Some(secs) = remaining_seconds {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
