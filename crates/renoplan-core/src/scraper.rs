//! Client for the third-party web scraping API.

use crate::{RenoplanError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Scraper connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

fn default_base_url() -> String {
    "https://api.firecrawl.dev".to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

/// Fetches a web page as markdown.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

fn parse_scrape_response(body: &str) -> Result<String> {
    let resp: ScrapeResponse = serde_json::from_str(body)
        .map_err(|e| RenoplanError::MalformedResponse(format!("scrape body: {}", e)))?;
    if !resp.success {
        return Err(RenoplanError::MalformedResponse(
            resp.error.unwrap_or_else(|| "scrape unsuccessful".to_string()),
        ));
    }
    Ok(resp.data.and_then(|d| d.markdown).unwrap_or_default())
}

/// [`PageScraper`] over the scraping API's `/v1/scrape` endpoint.
#[derive(Debug, Clone)]
pub struct HttpScraper {
    client: reqwest::Client,
    config: ScraperConfig,
}

impl HttpScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        let endpoint = format!("{}/v1/scrape", self.config.base_url.trim_end_matches('/'));
        let mut req = self.client.post(endpoint).json(&json!({
            "url": url,
            "formats": ["markdown"],
            "onlyMainContent": true,
        }));
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        tracing::debug!(target: "renoplan::products", "Scraping {}", url);
        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(RenoplanError::ScrapeFailed { status, message });
        }
        let body = resp.text().await?;
        parse_scrape_response(&body)
    }
}
