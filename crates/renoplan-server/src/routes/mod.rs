//! HTTP route handlers.

pub mod admin;
pub mod anonymous;
pub mod boms;
pub mod chat;
pub mod conversations;
pub mod products;
pub mod projects;

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use renoplan_core::repo::{
    BomRepository, ConversationRepository, ProductMatchRepository, ProjectRepository,
};
use renoplan_core::{RenoplanError, ensure_project_access};
use renoplan_types::{
    BillOfMaterials, BomItem, Conversation, ProductMatch, Project, SessionContext,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// All `/api` routes, relative to the `/api` prefix.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Assistant
        .route("/chat", post(chat::chat))
        .route("/extract-project-info", post(projects::extract))
        .route("/generate-bom", post(boms::generate))
        .route("/search-products", post(products::search))
        // Conversations
        .route("/conversations", get(conversations::list).post(conversations::create))
        .route(
            "/conversations/{id}",
            get(conversations::get)
                .put(conversations::rename)
                .delete(conversations::delete),
        )
        .route("/conversations/{id}/messages", post(conversations::append_message))
        // Projects
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/{id}",
            get(projects::get).put(projects::update).delete(projects::delete),
        )
        .route("/projects/{id}/boms", get(boms::list_for_project))
        // Bills of materials
        .route("/boms/{id}", get(boms::get))
        .route("/boms/{id}/status", put(boms::set_status))
        .route("/boms/{id}/shopping-list", get(boms::shopping_list))
        .route("/bom-items/{id}/matches", get(products::list_for_item))
        .route("/product-matches/{id}/selection", put(products::set_selection))
        .route(
            "/anonymous-chats/{session_id}",
            get(anonymous::load).put(anonymous::save).delete(anonymous::clear),
        )
        // Vendors and roles
        .route("/vendors", get(admin::list_active_vendors))
        .route("/admin/vendors", get(admin::list_vendors).post(admin::create_vendor))
        .route(
            "/admin/vendors/{id}",
            put(admin::update_vendor).delete(admin::delete_vendor),
        )
        .route("/admin/roles", post(admin::grant_role))
        .route("/admin/roles/{user_id}/{role}", delete(admin::revoke_role))
        .route("/health", get(health))
}

// Lookups that also enforce ownership. A caller sees a project-scoped
// record only if they own the project or are an admin.

pub(crate) fn owned_project(state: &AppState, ctx: &SessionContext, id: Uuid) -> Result<Project, ApiError> {
    let project = state
        .store
        .get_project(id)?
        .ok_or_else(|| RenoplanError::not_found("Project", id))?;
    ensure_project_access(ctx, &project)?;
    Ok(project)
}

pub(crate) fn owned_bom(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<BillOfMaterials, ApiError> {
    let bom = state
        .store
        .get_bom(id)?
        .ok_or_else(|| RenoplanError::not_found("Bill of materials", id))?;
    owned_project(state, ctx, bom.project_id)?;
    Ok(bom)
}

pub(crate) fn owned_item(state: &AppState, ctx: &SessionContext, id: Uuid) -> Result<BomItem, ApiError> {
    let item = state
        .store
        .get_bom_item(id)?
        .ok_or_else(|| RenoplanError::not_found("BOM item", id))?;
    owned_bom(state, ctx, item.bom_id)?;
    Ok(item)
}

pub(crate) fn owned_match(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<ProductMatch, ApiError> {
    let found = state
        .store
        .get_product_match(id)?
        .ok_or_else(|| RenoplanError::not_found("Product match", id))?;
    owned_item(state, ctx, found.bom_item_id)?;
    Ok(found)
}

pub(crate) fn owned_conversation(
    state: &AppState,
    ctx: &SessionContext,
    id: Uuid,
) -> Result<Conversation, ApiError> {
    let conversation = state
        .store
        .get_conversation(id)?
        .ok_or_else(|| RenoplanError::not_found("Conversation", id))?;
    let owner = conversation.user_id.is_some() && conversation.user_id == ctx.user_id;
    if !owner && !ctx.is_admin {
        return Err(ApiError::forbidden(format!("no access to conversation {}", id)));
    }
    Ok(conversation)
}
