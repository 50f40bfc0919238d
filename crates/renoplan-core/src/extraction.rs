//! Project detail extraction from chat history.

use crate::bom::ensure_project_access;
use crate::gateway::AiGateway;
use crate::prompts::{EXTRACT_SYSTEM_PROMPT, extract_project_tool};
use crate::repo::ProjectRepository;
use crate::store::Store;
use crate::{RenoplanError, Result};
use renoplan_types::{ChatTurn, Project, ProjectData, SessionContext};
use std::sync::Arc;
use uuid::Uuid;

pub struct ProjectExtractor {
    gateway: Arc<dyn AiGateway>,
    store: Arc<Store>,
}

impl ProjectExtractor {
    pub fn new(gateway: Arc<dyn AiGateway>, store: Arc<Store>) -> Self {
        Self { gateway, store }
    }

    /// Ask the gateway for whatever project details the conversation contains.
    pub async fn extract(&self, turns: &[ChatTurn]) -> Result<ProjectData> {
        if turns.is_empty() {
            return Ok(ProjectData::default());
        }
        let args = self
            .gateway
            .call_tool(EXTRACT_SYSTEM_PROMPT, turns, &extract_project_tool())
            .await?;
        let data: ProjectData = serde_json::from_value(args)
            .map_err(|e| RenoplanError::MalformedResponse(format!("project data: {}", e)))?;
        Ok(data)
    }

    /// Merge extracted details into a stored project and return the result.
    pub fn apply(&self, ctx: &SessionContext, project_id: Uuid, data: &ProjectData) -> Result<Project> {
        let mut project = self
            .store
            .get_project(project_id)?
            .ok_or_else(|| RenoplanError::not_found("Project", project_id))?;
        ensure_project_access(ctx, &project)?;

        project.apply_extraction(data);
        self.store.save_project(&project)?;
        tracing::debug!(target: "renoplan::api", "Applied extracted details to project {}", project_id);
        Ok(project)
    }
}
