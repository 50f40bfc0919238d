//! Streaming chat relay route.

use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use renoplan_core::ensure_project_access;
use renoplan_core::prompts::describe_project;
use renoplan_core::repo::ProjectRepository;
use renoplan_types::ChatRequest;
use std::sync::Arc;
use tracing::info;

/// Relay a chat completion from the AI gateway as `text/event-stream`.
///
/// Gateway failures before the stream starts are returned as JSON errors
/// with the gateway's 429/402/400 status preserved.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    if req.messages.is_empty() {
        return Err(ApiError::invalid("messages cannot be empty"));
    }

    let mut system = state.chat_system_prompt().to_string();
    if let Some(project_id) = req.project_id {
        // Project context is best effort; a missing or foreign project is ignored.
        if let Some(project) = state.store.get_project(project_id)? {
            if ensure_project_access(&ctx, &project).is_ok() {
                system.push_str("\n\nThe user is planning this project:\n");
                system.push_str(&describe_project(&project));
            }
        }
    }

    let stream = state.gateway.stream_chat(&system, &req.messages).await?;
    info!(
        target: "renoplan::api",
        "Relaying chat ({} turns, conversation {:?}, anonymous: {})",
        req.messages.len(),
        req.conversation_id,
        ctx.is_anonymous()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
