//! Shared application state.

use crate::config::Config;
use renoplan_core::prompts::CHAT_SYSTEM_PROMPT;
use renoplan_core::{
    AiGateway, AnonymousChatStore, BomGenerator, HttpGateway, HttpScraper, PageScraper,
    ProductSearcher, ProjectExtractor, Store,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub store: Arc<Store>,
    pub gateway: Arc<dyn AiGateway>,
    pub bom_generator: BomGenerator,
    pub product_searcher: ProductSearcher,
    pub project_extractor: ProjectExtractor,
    pub anonymous: AnonymousChatStore,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> renoplan_core::Result<Self> {
        let store = Arc::new(Store::open(&config.db_path)?);
        let gateway: Arc<dyn AiGateway> = Arc::new(HttpGateway::new(config.gateway.clone()));
        let scraper: Arc<dyn PageScraper> = Arc::new(HttpScraper::new(config.scraper.clone()));
        Ok(Self::with_services(config, store, gateway, scraper))
    }

    /// Assemble state around already-built services.
    pub fn with_services(
        config: Config,
        store: Arc<Store>,
        gateway: Arc<dyn AiGateway>,
        scraper: Arc<dyn PageScraper>,
    ) -> Self {
        Self {
            bom_generator: BomGenerator::new(gateway.clone(), store.clone()),
            product_searcher: ProductSearcher::new(gateway.clone(), scraper, store.clone()),
            project_extractor: ProjectExtractor::new(gateway.clone(), store.clone()),
            anonymous: AnonymousChatStore::new(config.anonymous_dir.clone()),
            store,
            gateway,
            config,
        }
    }

    pub fn chat_system_prompt(&self) -> &str {
        self.config
            .gateway
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(CHAT_SYSTEM_PROMPT)
    }
}
