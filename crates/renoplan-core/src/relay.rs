//! Streaming relay: posts chat history to the chat endpoint and turns the SSE
//! response into a growing assistant message.

use crate::sse::SseDecoder;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use renoplan_types::{ChatRequest, ErrorBody};
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Header carrying the signed-in user id.
pub const USER_ID_HEADER: &str = "x-user-id";

pub const RATE_LIMIT_NOTICE: &str = "Too many requests. Please wait a moment and try again.";
pub const PAYMENT_REQUIRED_NOTICE: &str =
    "AI credits are exhausted. Please add credits to your workspace to continue.";
pub const BAD_REQUEST_NOTICE: &str =
    "The image could not be processed. Please try a different image.";
pub const GENERIC_NOTICE: &str = "Failed to get a response from the assistant. Please try again.";

/// User-facing failure classes of a chat stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("rate limited")]
    RateLimited,
    #[error("payment required")]
    PaymentRequired,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Failed(String),
}

impl RelayError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => RelayError::RateLimited,
            402 => RelayError::PaymentRequired,
            400 => {
                let message = serde_json::from_str::<ErrorBody>(body)
                    .map(|b| b.error)
                    .ok()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| BAD_REQUEST_NOTICE.to_string());
                RelayError::BadRequest(message)
            }
            other => RelayError::Failed(format!("HTTP {}", other)),
        }
    }

    /// Message to show the user.
    pub fn notice(&self) -> String {
        match self {
            RelayError::RateLimited => RATE_LIMIT_NOTICE.to_string(),
            RelayError::PaymentRequired => PAYMENT_REQUIRED_NOTICE.to_string(),
            RelayError::BadRequest(message) => message.clone(),
            RelayError::Failed(_) => GENERIC_NOTICE.to_string(),
        }
    }

    /// HTTP status this failure corresponds to, when it has one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RelayError::RateLimited => Some(429),
            RelayError::PaymentRequired => Some(402),
            RelayError::BadRequest(_) => Some(400),
            RelayError::Failed(_) => None,
        }
    }
}

/// Lifecycle of one relayed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    #[default]
    Idle,
    Streaming,
    Done,
    RolledBack,
}

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

/// Opens a streaming chat response.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError>;
}

/// [`ChatTransport`] that posts to the server's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
    user_id: Option<Uuid>,
}

impl HttpChatTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError> {
        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(user_id) = self.user_id {
            req = req.header(USER_ID_HEADER, user_id.to_string());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RelayError::Failed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(target: "renoplan::relay", "Chat endpoint returned {}: {}", status, body);
            return Err(RelayError::from_status(status, &body));
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::Failed(e.to_string())));
        Ok(Box::pin(stream))
    }
}

/// Read `stream` to completion, calling `on_text` with the accumulated text
/// every time it grows. Returns the final text.
///
/// Reading stops at the `[DONE]` sentinel; whatever follows is never read.
pub async fn relay<S, F>(mut stream: S, mut on_text: F) -> Result<String, RelayError>
where
    S: Stream<Item = Result<Bytes, RelayError>> + Unpin,
    F: FnMut(&str),
{
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if !decoder.feed(&chunk).is_empty() {
            on_text(decoder.text());
        }
        if decoder.is_done() {
            break;
        }
    }
    if !decoder.finish().is_empty() {
        on_text(decoder.text());
    }
    Ok(decoder.into_text())
}
