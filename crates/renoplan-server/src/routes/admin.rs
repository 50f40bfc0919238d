//! Vendor catalog and role management. Everything but the active vendor
//! list requires the admin role.

use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use renoplan_core::RenoplanError;
use renoplan_core::repo::{UserRoleRepository, VendorRepository};
use renoplan_types::{AppRole, UserRole, Vendor, VendorInput};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Active vendors, for choosing where to search.
pub async fn list_active_vendors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Vendor>>, ApiError> {
    Ok(Json(state.store.list_vendors(true)?))
}

pub async fn list_vendors(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<Vendor>>, ApiError> {
    session.require_admin()?;
    Ok(Json(state.store.list_vendors(false)?))
}

pub async fn create_vendor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(input): Json<VendorInput>,
) -> Result<Json<Vendor>, ApiError> {
    let admin = session.require_admin()?;
    let vendor = state.store.create_vendor(&input)?;
    info!(target: "renoplan::api", "Admin {} added vendor {}", admin, vendor.name);
    Ok(Json(vendor))
}

pub async fn update_vendor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(input): Json<VendorInput>,
) -> Result<Json<Vendor>, ApiError> {
    session.require_admin()?;
    Ok(Json(state.store.update_vendor(id, &input)?))
}

pub async fn delete_vendor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    session.require_admin()?;
    if !state.store.delete_vendor(id)? {
        return Err(RenoplanError::not_found("Vendor", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_role(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(grant): Json<UserRole>,
) -> Result<Json<UserRole>, ApiError> {
    let admin = session.require_admin()?;
    state.store.grant_role(grant.user_id, grant.role)?;
    info!(
        target: "renoplan::api",
        "Admin {} granted {} to {}",
        admin,
        grant.role.as_str(),
        grant.user_id
    );
    Ok(Json(grant))
}

pub async fn revoke_role(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((user_id, role)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    session.require_admin()?;
    let role = AppRole::parse(&role).ok_or_else(|| ApiError::invalid(format!("unknown role: {}", role)))?;
    if !state.store.revoke_role(user_id, role)? {
        return Err(ApiError::invalid(format!("{} does not have role {}", user_id, role.as_str())));
    }
    Ok(StatusCode::NO_CONTENT)
}
