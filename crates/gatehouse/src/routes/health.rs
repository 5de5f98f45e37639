//! Health check endpoints.

use axum::{Json, extract::State};
use gatehouse_common::MetricsSnapshot;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    sessions: usize,
    auth_base_url: String,
}

/// Readiness check.
///
/// The authentication API is not probed; an unreachable API shows up as
/// failed logins instead.
pub async fn ready_check(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready",
        sessions: state.sessions.len().await,
        auth_base_url: state.config.auth.base_url.clone(),
    })
}

/// Metrics endpoint (for monitoring)
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics_snapshot().await)
}
