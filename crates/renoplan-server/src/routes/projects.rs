//! Project routes and project detail extraction.

use super::owned_project;
use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use renoplan_core::repo::ProjectRepository;
use renoplan_types::{ExtractProjectRequest, ExtractProjectResponse, Project, ProjectUpdate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<Project>>, ApiError> {
    let user_id = session.require_user()?;
    Ok(Json(state.store.list_projects(user_id)?))
}

fn check_budget(budget: Option<f64>) -> Result<(), ApiError> {
    if budget.is_some_and(|b| !b.is_finite() || b < 0.0) {
        return Err(ApiError::invalid("budget must be a non-negative number"));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let user_id = session.require_user()?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("project name cannot be empty"));
    }
    check_budget(req.budget)?;

    let mut project = Project::new(user_id, name);
    project.description = req.description.filter(|d| !d.trim().is_empty());
    project.budget = req.budget;
    state.store.create_project(&project)?;

    info!(target: "renoplan::api", "Created project {} ({})", project.id, project.name);
    Ok(Json(project))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(owned_project(&state, &session.0, id)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    owned_project(&state, &session.0, id)?;
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::invalid("project name cannot be empty"));
    }
    check_budget(update.budget)?;
    Ok(Json(state.store.update_project(id, &update)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    owned_project(&state, &session.0, id)?;
    state.store.delete_project(id)?;
    info!(target: "renoplan::api", "Deleted project {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Extract project details from chat history. With `projectId` the result
/// is also merged into that project.
pub async fn extract(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<ExtractProjectRequest>,
) -> Result<Json<ExtractProjectResponse>, ApiError> {
    let project_data = state.project_extractor.extract(&req.messages).await?;
    if let Some(project_id) = req.project_id {
        state
            .project_extractor
            .apply(&session.0, project_id, &project_data)?;
    }
    Ok(Json(ExtractProjectResponse { project_data }))
}
