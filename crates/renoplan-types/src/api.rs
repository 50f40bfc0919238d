//! Request and response bodies for the HTTP API.
//!
//! Bodies use camelCase field names; entity payloads nested inside them keep
//! their snake_case row names.

use crate::{Message, MessageRole, ProductMatch, ProjectData};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One turn of chat history sent to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&Message> for ChatTurn {
    fn from(m: &Message) -> Self {
        Self {
            role: m.role,
            content: m.content.clone(),
            image_url: m.image_url.clone(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
}

/// Body of `POST /api/extract-project-info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractProjectRequest {
    pub messages: Vec<ChatTurn>,
    /// When set, the extracted fields are merged into this stored project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractProjectResponse {
    pub project_data: ProjectData,
}

/// Body of `POST /api/generate-bom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBomRequest {
    pub project_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBomResponse {
    pub bom_id: Uuid,
    pub total_cost: f64,
    pub item_count: usize,
}

/// Body of `POST /api/search-products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsRequest {
    pub bom_item_id: Uuid,
    pub search_query: String,
    /// Restrict the search to these vendor names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsResponse {
    pub match_count: usize,
    pub matches: Vec<ProductMatch>,
}

/// JSON error body returned by failing routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_camel_case() {
        let json = r#"{"messages":[{"role":"user","content":"hi","imageUrl":"https://x/y.png"}],"conversationId":"00000000-0000-0000-0000-000000000001","isAnonymous":true}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].image_url.as_deref(), Some("https://x/y.png"));
        assert_eq!(req.is_anonymous, Some(true));
        assert!(req.project_id.is_none());
    }

    #[test]
    fn test_generate_bom_response_shape() {
        let resp = GenerateBomResponse {
            bom_id: Uuid::nil(),
            total_cost: 25.0,
            item_count: 2,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["totalCost"], 25.0);
        assert_eq!(value["itemCount"], 2);
        assert!(value.get("bomId").is_some());
    }
}
