//! Chat history of visitors who are not signed in, keyed by a client
//! generated session id.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use renoplan_types::Message;
use std::sync::Arc;

pub async fn load(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.anonymous.load(&session_id)?))
}

/// Replace the stored history with the given messages.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(messages): Json<Vec<Message>>,
) -> Result<StatusCode, ApiError> {
    state.anonymous.save(&session_id, &messages)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.anonymous.clear(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
