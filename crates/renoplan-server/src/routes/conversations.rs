//! Conversation and message routes.

use super::{owned_conversation, owned_project};
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use renoplan_core::RenoplanError;
use renoplan_core::repo::{ConversationRepository, MessageRepository};
use renoplan_types::{Conversation, ConversationDetail, Message, MessageRole, title_from_prompt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// The caller's conversations, most recently updated first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let user_id = session.require_user()?;
    let conversations = state.store.list_conversations(Some(user_id))?;
    Ok(Json(conversations))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<CreateConversationRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let user_id = session.require_user()?;
    if let Some(project_id) = req.project_id {
        owned_project(&state, &session.0, project_id)?;
    }

    let title = title_from_prompt(req.title.as_deref().unwrap_or_default());
    let conversation = Conversation::new(title, Some(user_id), req.project_id);
    state.store.create_conversation(&conversation)?;

    info!(target: "renoplan::api", "Created conversation {}", conversation.id);
    Ok(Json(conversation))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationDetail>, ApiError> {
    let conversation = owned_conversation(&state, &session.0, id)?;
    let messages = state.store.list_messages(id)?;
    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

pub async fn rename(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<Conversation>, ApiError> {
    owned_conversation(&state, &session.0, id)?;
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::invalid("title cannot be empty"));
    }

    state.store.rename_conversation(id, title)?;
    let conversation = state
        .store
        .get_conversation(id)?
        .ok_or_else(|| RenoplanError::not_found("Conversation", id))?;
    Ok(Json(conversation))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    owned_conversation(&state, &session.0, id)?;
    state.store.delete_conversation(id)?;
    info!(target: "renoplan::api", "Deleted conversation {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageRequest {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Append one message. Messages are never edited afterwards.
pub async fn append_message(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<AppendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    owned_conversation(&state, &session.0, id)?;
    if req.content.trim().is_empty() && req.image_url.is_none() {
        return Err(ApiError::invalid("message cannot be empty"));
    }

    let message = Message::new(id, req.role, req.content, req.image_url);
    state.store.append_message(&message)?;
    Ok(Json(message))
}
