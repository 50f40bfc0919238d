//! Error types for Renoplan.

use crate::relay::RelayError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RenoplanError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("AI gateway returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Scraper returned {status}: {message}")]
    ScrapeFailed { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Chat stream failed: {0}")]
    Relay(#[from] RelayError),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl RenoplanError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        RenoplanError::NotFound { entity, id }
    }
}
