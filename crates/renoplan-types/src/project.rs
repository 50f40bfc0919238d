//! Renovation project types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a renovation project stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    #[default]
    Planning,
    Design,
    Bidding,
    InProgress,
    Completed,
    OnHold,
}

/// A renovation project owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Budget set by the user.
    #[serde(default)]
    pub budget: Option<f64>,
    pub phase: ProjectPhase,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub materials_mentioned: Vec<String>,
    #[serde(default)]
    pub style_preferences: Vec<String>,
    /// Budget estimated by the assistant from the conversation.
    #[serde(default)]
    pub budget_estimate: Option<f64>,
    #[serde(default)]
    pub timeline_weeks: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            description: None,
            budget: None,
            phase: ProjectPhase::Planning,
            key_features: Vec::new(),
            materials_mentioned: Vec::new(),
            style_preferences: Vec::new(),
            budget_estimate: None,
            timeline_weeks: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge assistant-extracted fields into this project.
    ///
    /// Scalars are only overwritten when the extraction provides them; list
    /// fields are extended without duplicates (case-insensitive).
    pub fn apply_extraction(&mut self, data: &ProjectData) {
        if let Some(name) = data.name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.name = name.trim().to_string();
        }
        if let Some(desc) = data.description.as_deref().filter(|d| !d.trim().is_empty()) {
            self.description = Some(desc.trim().to_string());
        }
        if data.budget_estimate.is_some() {
            self.budget_estimate = data.budget_estimate;
        }
        if data.timeline_weeks.is_some() {
            self.timeline_weeks = data.timeline_weeks;
        }
        merge_unique(&mut self.key_features, &data.key_features);
        merge_unique(&mut self.materials_mentioned, &data.materials_mentioned);
        merge_unique(&mut self.style_preferences, &data.style_preferences);
        self.updated_at = Utc::now();
    }
}

fn merge_unique(target: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if !target.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            target.push(item.to_string());
        }
    }
}

/// User-editable project fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub phase: Option<ProjectPhase>,
}

/// Project details the assistant extracted from a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_weeks: Option<u32>,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub materials_mentioned: Vec<String>,
    #[serde(default)]
    pub style_preferences: Vec<String>,
}
