//! Core chat, persistence and generation logic for Renoplan.

mod anonymous;
mod bom;
mod chat;
mod error;
mod extraction;
mod gateway;
mod products;
pub mod prompts;
mod relay;
pub mod repo;
mod scraper;
mod sse;
mod store;

pub use anonymous::{AnonymousChatStore, storage_key};
pub use bom::{BomGenerator, ensure_project_access};
pub use chat::ChatController;
pub use error::RenoplanError;
pub use extraction::ProjectExtractor;
pub use gateway::{AiGateway, GatewayConfig, GatewayStream, HttpGateway, ToolSpec};
pub use products::{MAX_MATCHES_PER_VENDOR, MAX_PAGE_CHARS, ProductSearcher};
pub use relay::{
    ByteStream, ChatTransport, HttpChatTransport, RelayError, RelayState, USER_ID_HEADER, relay,
};
pub use scraper::{HttpScraper, PageScraper, ScraperConfig};
pub use sse::SseDecoder;
pub use store::Store;

/// Result type for Renoplan operations.
pub type Result<T> = std::result::Result<T, RenoplanError>;
