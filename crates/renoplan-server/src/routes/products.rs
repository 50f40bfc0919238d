//! Product search and match selection routes.

use super::{owned_item, owned_match};
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use renoplan_types::{ProductMatch, SearchProductsRequest, SearchProductsResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub async fn search(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<SearchProductsRequest>,
) -> Result<Json<SearchProductsResponse>, ApiError> {
    owned_item(&state, &session.0, req.bom_item_id)?;
    let resp = state
        .product_searcher
        .search(req.bom_item_id, &req.search_query, req.vendors.as_deref())
        .await?;
    Ok(Json(resp))
}

pub async fn list_for_item(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Vec<ProductMatch>>, ApiError> {
    owned_item(&state, &session.0, item_id)?;
    Ok(Json(state.product_searcher.matches_for_item(item_id)?))
}

#[derive(Deserialize)]
pub struct SelectionRequest {
    pub selected: bool,
}

/// Put a match on, or take it off, its BOM's shopping list.
pub async fn set_selection(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<ProductMatch>, ApiError> {
    owned_match(&state, &session.0, id)?;
    Ok(Json(state.product_searcher.set_selected(id, req.selected)?))
}
