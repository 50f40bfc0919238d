//! Bill of materials generation.
//!
//! One forced function call to the gateway turns a project (and optionally
//! its conversation) into categorized line items. Totals are computed here,
//! once, and stored alongside the BOM.

use crate::gateway::AiGateway;
use crate::prompts::{BOM_SYSTEM_PROMPT, bom_tool, describe_project};
use crate::repo::{BomRepository, ConversationRepository, MessageRepository, ProjectRepository};
use crate::store::Store;
use crate::{RenoplanError, Result};
use chrono::Utc;
use renoplan_types::{
    BillOfMaterials, BomItem, BomStatus, ChatTurn, GenerateBomResponse, ItemPriority, MessageRole,
    Project, SessionContext, line_total, total_estimated_cost,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct GeneratedBom {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    items: Vec<GeneratedItem>,
}

#[derive(Debug, Deserialize)]
struct GeneratedItem {
    #[serde(default)]
    category: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    estimated_unit_price: f64,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

fn parse_priority(s: Option<&str>) -> ItemPriority {
    match s.map(|p| p.trim().to_lowercase()).as_deref() {
        Some("essential") | Some("high") => ItemPriority::Essential,
        Some("optional") | Some("low") => ItemPriority::Optional,
        _ => ItemPriority::Recommended,
    }
}

/// Turn generated items into line items, dropping unusable ones.
fn build_items(bom_id: Uuid, generated: Vec<GeneratedItem>) -> Vec<BomItem> {
    generated
        .into_iter()
        .filter_map(|g| {
            let name = g.name.trim();
            let usable = !name.is_empty()
                && g.quantity.is_finite()
                && g.quantity > 0.0
                && g.estimated_unit_price.is_finite()
                && g.estimated_unit_price >= 0.0;
            if !usable {
                tracing::debug!(target: "renoplan::bom", "Dropping unusable item {:?}", g);
                return None;
            }
            let category = match g.category.trim() {
                "" => "General".to_string(),
                c => c.to_string(),
            };
            Some(BomItem {
                id: Uuid::new_v4(),
                bom_id,
                category,
                name: name.to_string(),
                description: g.description.filter(|d| !d.trim().is_empty()),
                quantity: g.quantity,
                unit: g
                    .unit
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| "each".to_string()),
                estimated_unit_price: g.estimated_unit_price,
                estimated_total_price: line_total(g.quantity, g.estimated_unit_price),
                priority: parse_priority(g.priority.as_deref()),
                notes: g.notes.filter(|n| !n.trim().is_empty()),
            })
        })
        .collect()
}

/// Fail unless the caller owns the project or is an admin.
pub fn ensure_project_access(ctx: &SessionContext, project: &Project) -> Result<()> {
    if ctx.is_admin || ctx.user_id == Some(project.user_id) {
        Ok(())
    } else {
        Err(RenoplanError::Forbidden(format!(
            "no access to project {}",
            project.id
        )))
    }
}

/// Generates and stores bills of materials.
pub struct BomGenerator {
    gateway: Arc<dyn AiGateway>,
    store: Arc<Store>,
}

impl BomGenerator {
    pub fn new(gateway: Arc<dyn AiGateway>, store: Arc<Store>) -> Self {
        Self { gateway, store }
    }

    /// Generate a BOM for a project, optionally grounded in a conversation.
    pub async fn generate(
        &self,
        ctx: &SessionContext,
        project_id: Uuid,
        conversation_id: Option<Uuid>,
    ) -> Result<GenerateBomResponse> {
        let project = self
            .store
            .get_project(project_id)?
            .ok_or_else(|| RenoplanError::not_found("Project", project_id))?;
        ensure_project_access(ctx, &project)?;

        let mut turns = Vec::new();
        if let Some(conversation_id) = conversation_id {
            let conversation = self
                .store
                .get_conversation(conversation_id)?
                .ok_or_else(|| RenoplanError::not_found("Conversation", conversation_id))?;
            let owner = conversation.user_id.is_some() && conversation.user_id == ctx.user_id;
            let same_project = conversation.project_id.is_none_or(|p| p == project_id);
            if !ctx.is_admin && !(owner && same_project) {
                return Err(RenoplanError::Forbidden(format!(
                    "no access to conversation {}",
                    conversation_id
                )));
            }
            turns.extend(
                self.store
                    .list_messages(conversation_id)?
                    .iter()
                    .map(|m| ChatTurn {
                        role: m.role,
                        content: m.content.clone(),
                        image_url: None,
                    }),
            );
        }
        turns.push(ChatTurn {
            role: MessageRole::User,
            content: format!(
                "{}\n\nCreate the bill of materials for this project.",
                describe_project(&project)
            ),
            image_url: None,
        });

        let args = self
            .gateway
            .call_tool(BOM_SYSTEM_PROMPT, &turns, &bom_tool())
            .await?;
        let generated: GeneratedBom = serde_json::from_value(args)
            .map_err(|e| RenoplanError::MalformedResponse(format!("bill of materials: {}", e)))?;

        let bom_id = Uuid::new_v4();
        let items = build_items(bom_id, generated.items);
        if items.is_empty() {
            return Err(RenoplanError::MalformedResponse(
                "bill of materials contained no usable items".into(),
            ));
        }

        let total_cost = total_estimated_cost(&items);
        let bom = BillOfMaterials {
            id: bom_id,
            project_id,
            conversation_id,
            title: generated
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("{} materials", project.name)),
            total_estimated_cost: total_cost,
            status: BomStatus::Draft,
            created_at: Utc::now(),
        };
        self.store.create_bom(&bom, &items)?;

        tracing::info!(
            target: "renoplan::bom",
            "Generated BOM {} for project {}: {} items, ${:.2}",
            bom_id,
            project_id,
            items.len(),
            total_cost
        );

        Ok(GenerateBomResponse {
            bom_id,
            total_cost,
            item_count: items.len(),
        })
    }
}
