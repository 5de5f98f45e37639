//! Login view endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use gatehouse_common::LoginStatus;
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::watch;

use super::ApiError;
use crate::state::AppState;
use crate::view::LoginForm;

/// Open a new login view
pub async fn open_session(State(state): State<AppState>) -> (StatusCode, Json<LoginStatus>) {
    let view = state.sessions.open().await;
    (StatusCode::CREATED, Json(view.status().await))
}

/// Current state of a login view (phase, countdown, challenge)
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<LoginStatus>, ApiError> {
    let view = state.sessions.get(&session_id).await?;
    Ok(Json(view.status().await))
}

/// Close a login view, cancelling any countdown
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.close(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live cooldown countdown as server-sent `countdown` events.
///
/// Sends the remaining seconds right away and again on every change. The
/// stream ends once the countdown reaches zero or the view is closed.
pub async fn stream_countdown(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let view = state.sessions.get(&session_id).await?;
    // Publish any expiry the ticker has not applied yet
    view.status().await;
    Ok(Sse::new(countdown_events(view.countdown())).keep_alive(KeepAlive::default()))
}

fn countdown_events(
    receiver: watch::Receiver<u64>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some((receiver, true)), |state| async move {
        let (mut receiver, first) = state?;
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let remaining = *receiver.borrow_and_update();
        let event = Event::default()
            .event("countdown")
            .data(remaining.to_string());
        let next = (remaining > 0).then_some((receiver, false));
        Some((Ok(event), next))
    })
}

#[derive(Serialize)]
pub struct LoginSuccess {
    status: LoginStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    user: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<serde_json::Value>,
}

/// Submit credentials through the guard
pub async fn submit_login(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginSuccess>, ApiError> {
    let view = state.sessions.get(&session_id).await?;

    let result = view.submit(&form, state.authenticator.as_ref()).await;
    state.metrics.record(&result);
    let status = view.status().await;

    match result {
        Ok(user) => Ok(Json(LoginSuccess {
            status,
            token: user.token,
            user: user.user,
            profile: user.profile,
        })),
        Err(error) => Err(ApiError::from(error).with_status(status)),
    }
}
