//! System prompts and function schemas sent to the AI gateway.

use crate::gateway::ToolSpec;
use renoplan_types::Project;
use serde_json::json;

pub const CHAT_SYSTEM_PROMPT: &str = "You are a friendly, knowledgeable renovation planning assistant. \
Help homeowners scope their renovation: ask about rooms, dimensions, style, budget and timeline, \
suggest materials and layouts, and flag work that needs a licensed professional or a permit. \
When the user shares a photo, describe what you see and how it affects the plan. \
Keep answers concise and practical.";

pub const EXTRACT_SYSTEM_PROMPT: &str = "Extract structured renovation project details from the \
conversation. Only include fields the user actually stated or clearly implied. Budget is in US \
dollars, timeline in weeks.";

pub const BOM_SYSTEM_PROMPT: &str = "You are a renovation estimator. Produce a complete, \
categorized bill of materials for the project described. Use realistic quantities and current \
US retail unit prices. Group items into categories such as Demolition, Framing, Electrical, \
Plumbing, Flooring, Fixtures, Finishes and Hardware.";

pub const PRODUCT_SYSTEM_PROMPT: &str = "You extract product listings from a vendor search \
results page. Return only products that plausibly satisfy the requested item, with absolute \
URLs and numeric prices. Score each match from 0 to 1 by how well it fits the item.";

/// Describe a project for the BOM prompt.
pub fn describe_project(project: &Project) -> String {
    let mut lines = vec![format!("Project: {}", project.name)];
    if let Some(description) = &project.description {
        lines.push(format!("Description: {}", description));
    }
    if let Some(budget) = project.budget.or(project.budget_estimate) {
        lines.push(format!("Budget: ${:.0}", budget));
    }
    if let Some(weeks) = project.timeline_weeks {
        lines.push(format!("Timeline: {} weeks", weeks));
    }
    for (label, values) in [
        ("Key features", &project.key_features),
        ("Materials mentioned", &project.materials_mentioned),
        ("Style preferences", &project.style_preferences),
    ] {
        if !values.is_empty() {
            lines.push(format!("{}: {}", label, values.join(", ")));
        }
    }
    lines.join("\n")
}

pub fn extract_project_tool() -> ToolSpec {
    ToolSpec {
        name: "extract_project_info",
        description: "Record renovation project details mentioned in the conversation.",
        parameters: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Short project name"},
                "description": {"type": "string"},
                "budget_estimate": {"type": "number"},
                "timeline_weeks": {"type": "integer"},
                "key_features": {"type": "array", "items": {"type": "string"}},
                "materials_mentioned": {"type": "array", "items": {"type": "string"}},
                "style_preferences": {"type": "array", "items": {"type": "string"}},
            },
        }),
    }
}

pub fn bom_tool() -> ToolSpec {
    ToolSpec {
        name: "create_bill_of_materials",
        description: "Create a categorized bill of materials for the renovation.",
        parameters: json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "category": {"type": "string"},
                            "name": {"type": "string"},
                            "description": {"type": "string"},
                            "quantity": {"type": "number"},
                            "unit": {"type": "string"},
                            "estimated_unit_price": {"type": "number"},
                            "priority": {"type": "string", "enum": ["essential", "recommended", "optional"]},
                            "notes": {"type": "string"},
                        },
                        "required": ["category", "name", "quantity", "unit", "estimated_unit_price"],
                    },
                },
            },
            "required": ["items"],
        }),
    }
}

pub fn product_tool() -> ToolSpec {
    ToolSpec {
        name: "extract_products",
        description: "List products from the search results that match the requested item.",
        parameters: json!({
            "type": "object",
            "properties": {
                "products": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "product_name": {"type": "string"},
                            "product_url": {"type": "string"},
                            "price": {"type": "number"},
                            "match_score": {"type": "number", "minimum": 0, "maximum": 1},
                        },
                        "required": ["product_name", "match_score"],
                    },
                },
            },
            "required": ["products"],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_describe_project() {
        let mut project = Project::new(Uuid::new_v4(), "Laundry room");
        project.budget_estimate = Some(4500.0);
        project.materials_mentioned = vec!["Vinyl plank".into(), "Butcher block".into()];

        let text = describe_project(&project);
        assert!(text.starts_with("Project: Laundry room"));
        assert!(text.contains("Budget: $4500"));
        assert!(text.contains("Materials mentioned: Vinyl plank, Butcher block"));
        assert!(!text.contains("Style preferences"));
    }
}
