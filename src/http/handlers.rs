use super::state::AppState;
use crate::session::SessionInfo;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};

/// GET /sessions
/// List live sessions with their creation time
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<SessionInfo> = state.registry.sessions();
    (StatusCode::OK, Json(sessions))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
