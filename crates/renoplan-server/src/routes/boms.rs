//! Bill of materials routes.

use super::{owned_bom, owned_project};
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use renoplan_core::repo::BomRepository;
use renoplan_types::{
    BillOfMaterials, BomDetail, BomStatus, GenerateBomRequest, GenerateBomResponse,
    ShoppingListEntry,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub async fn generate(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<GenerateBomRequest>,
) -> Result<Json<GenerateBomResponse>, ApiError> {
    let resp = state
        .bom_generator
        .generate(&session.0, req.project_id, req.conversation_id)
        .await?;
    Ok(Json(resp))
}

pub async fn list_for_project(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<BillOfMaterials>>, ApiError> {
    owned_project(&state, &session.0, project_id)?;
    Ok(Json(state.store.list_boms(project_id)?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<BomDetail>, ApiError> {
    let bom = owned_bom(&state, &session.0, id)?;
    let items = state.store.list_bom_items(id)?;
    Ok(Json(BomDetail { bom, items }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: BomStatus,
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<BillOfMaterials>, ApiError> {
    let mut bom = owned_bom(&state, &session.0, id)?;
    state.store.set_bom_status(id, req.status)?;
    bom.status = req.status;
    Ok(Json(bom))
}

/// Selected product matches of a BOM, each with the item it fulfils.
pub async fn shopping_list(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ShoppingListEntry>>, ApiError> {
    owned_bom(&state, &session.0, id)?;
    Ok(Json(state.product_searcher.shopping_list(id)?))
}
