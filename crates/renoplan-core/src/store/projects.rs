use super::{Store, enum_from_sql, enum_to_sql, list_from_sql, list_to_sql, parse_time, parse_uuid};
use crate::repo::ProjectRepository;
use crate::{RenoplanError, Result};
use chrono::Utc;
use renoplan_types::{Project, ProjectPhase, ProjectUpdate};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

impl ProjectRepository for Store {
    fn create_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO projects (
                id, user_id, name, description, budget, phase, key_features,
                materials_mentioned, style_preferences, budget_estimate, timeline_weeks,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                project.id.to_string(),
                project.user_id.to_string(),
                project.name,
                project.description,
                project.budget,
                enum_to_sql(&project.phase)?,
                list_to_sql(&project.key_features)?,
                list_to_sql(&project.materials_mentioned)?,
                list_to_sql(&project.style_preferences)?,
                project.budget_estimate,
                project.timeline_weeks,
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn()?;
        let project = conn
            .query_row(
                "SELECT * FROM projects WHERE id = ?1",
                params![id.to_string()],
                row_to_project,
            )
            .optional()?;
        Ok(project)
    }

    fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM projects WHERE user_id = ?1 ORDER BY updated_at DESC")?;
        let projects = stmt
            .query_map(params![user_id.to_string()], row_to_project)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn update_project(&self, id: Uuid, update: &ProjectUpdate) -> Result<Project> {
        let mut project = self
            .get_project(id)?
            .ok_or_else(|| RenoplanError::not_found("Project", id))?;

        if let Some(name) = &update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(RenoplanError::InvalidInput("project name cannot be empty".into()));
            }
            project.name = name.to_string();
        }
        if let Some(description) = &update.description {
            project.description = Some(description.clone());
        }
        if let Some(budget) = update.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(RenoplanError::InvalidInput("budget must be a non-negative number".into()));
            }
            project.budget = Some(budget);
        }
        if let Some(phase) = update.phase {
            project.phase = phase;
        }
        project.updated_at = Utc::now();

        self.save_project(&project)?;
        Ok(project)
    }

    fn save_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE projects SET
                name = ?1,
                description = ?2,
                budget = ?3,
                phase = ?4,
                key_features = ?5,
                materials_mentioned = ?6,
                style_preferences = ?7,
                budget_estimate = ?8,
                timeline_weeks = ?9,
                updated_at = ?10
            WHERE id = ?11
            "#,
            params![
                project.name,
                project.description,
                project.budget,
                enum_to_sql(&project.phase)?,
                list_to_sql(&project.key_features)?,
                list_to_sql(&project.materials_mentioned)?,
                list_to_sql(&project.style_preferences)?,
                project.budget_estimate,
                project.timeline_weeks,
                project.updated_at.to_rfc3339(),
                project.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RenoplanError::not_found("Project", project.id));
        }
        Ok(())
    }

    fn delete_project(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let id: String = row.get("id")?;
    let user_id: String = row.get("user_id")?;
    let phase: String = row.get("phase")?;
    let key_features: String = row.get("key_features")?;
    let materials_mentioned: String = row.get("materials_mentioned")?;
    let style_preferences: String = row.get("style_preferences")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Project {
        id: parse_uuid(&id),
        user_id: parse_uuid(&user_id),
        name: row.get("name")?,
        description: row.get("description")?,
        budget: row.get("budget")?,
        phase: enum_from_sql(&phase).unwrap_or(ProjectPhase::Planning),
        key_features: list_from_sql(&key_features),
        materials_mentioned: list_from_sql(&materials_mentioned),
        style_preferences: list_from_sql(&style_preferences),
        budget_estimate: row.get("budget_estimate")?,
        timeline_weeks: row.get("timeline_weeks")?,
        created_at: parse_time(&created_at),
        updated_at: parse_time(&updated_at),
    })
}
