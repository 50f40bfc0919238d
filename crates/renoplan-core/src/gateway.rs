//! Client for the OpenAI-compatible AI gateway.

use crate::{RenoplanError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use renoplan_types::ChatTurn;
use serde::Deserialize;
use serde_json::{Value, json};
use std::pin::Pin;

pub type GatewayStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Connection settings for the AI gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Model used for streamed chat replies.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Model used for structured function calls.
    #[serde(default = "default_tool_model")]
    pub tool_model: String,
    /// Replaces the built-in chat system prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_tool_model() -> String {
    "gpt-4o".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            chat_model: default_chat_model(),
            tool_model: default_tool_model(),
            system_prompt: None,
        }
    }
}

/// A function the model is forced to call, with its JSON schema.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Start a streaming chat completion and return the raw SSE bytes.
    async fn stream_chat(&self, system: &str, turns: &[ChatTurn]) -> Result<GatewayStream>;

    /// Force one call of `tool` and return its parsed arguments.
    async fn call_tool(&self, system: &str, turns: &[ChatTurn], tool: &ToolSpec) -> Result<Value>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

/// Convert chat history to the gateway's message format, system prompt first.
fn wire_messages(system: &str, turns: &[ChatTurn]) -> Vec<Value> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    if !system.is_empty() {
        messages.push(json!({"role": "system", "content": system}));
    }
    for turn in turns {
        let content = match &turn.image_url {
            Some(url) => json!([
                {"type": "text", "text": turn.content},
                {"type": "image_url", "image_url": {"url": url}},
            ]),
            None => Value::String(turn.content.clone()),
        };
        messages.push(json!({"role": turn.role.as_str(), "content": content}));
    }
    messages
}

/// Pull the arguments of `tool_name` out of a non-streamed completion.
fn extract_tool_arguments(body: &str, tool_name: &str) -> Result<Value> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| RenoplanError::MalformedResponse(format!("completion body: {}", e)))?;

    let call = response
        .choices
        .into_iter()
        .flat_map(|c| c.message.tool_calls)
        .find(|c| c.function.name == tool_name)
        .ok_or_else(|| {
            RenoplanError::MalformedResponse(format!("no {} call in response", tool_name))
        })?;

    serde_json::from_str(&call.function.arguments).map_err(|e| {
        RenoplanError::MalformedResponse(format!("{} arguments: {}", tool_name, e))
    })
}

/// [`AiGateway`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .json(body);
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(target: "renoplan::gateway", "Gateway returned {}: {}", status, message);
            return Err(RenoplanError::Upstream { status, message });
        }
        Ok(resp)
    }
}

#[async_trait]
impl AiGateway for HttpGateway {
    async fn stream_chat(&self, system: &str, turns: &[ChatTurn]) -> Result<GatewayStream> {
        let body = json!({
            "model": self.config.chat_model,
            "messages": wire_messages(system, turns),
            "stream": true,
        });
        tracing::debug!(target: "renoplan::gateway", "Streaming chat with {} turns", turns.len());

        let resp = self.post(&body).await?;
        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(RenoplanError::from));
        Ok(Box::pin(stream))
    }

    async fn call_tool(&self, system: &str, turns: &[ChatTurn], tool: &ToolSpec) -> Result<Value> {
        let body = json!({
            "model": self.config.tool_model,
            "messages": wire_messages(system, turns),
            "tools": [{
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                },
            }],
            "tool_choice": {"type": "function", "function": {"name": tool.name}},
        });
        tracing::debug!(target: "renoplan::gateway", "Calling tool {}", tool.name);

        let resp = self.post(&body).await?;
        let text = resp.text().await?;
        extract_tool_arguments(&text, tool.name)
    }
}
