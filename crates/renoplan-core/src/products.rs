//! Vendor product search for BOM line items.
//!
//! For each selected vendor the search page is scraped, then an extraction
//! call turns the page into scored product candidates which are stored as
//! product matches.

use crate::gateway::AiGateway;
use crate::prompts::{PRODUCT_SYSTEM_PROMPT, product_tool};
use crate::repo::{BomRepository, ProductMatchRepository, VendorRepository};
use crate::scraper::PageScraper;
use crate::store::Store;
use crate::{RenoplanError, Result};
use chrono::Utc;
use renoplan_types::{
    BomItem, ChatTurn, MessageRole, ProductMatch, SearchProductsResponse, ShoppingListEntry, Vendor,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Characters of scraped page content sent to the extraction call.
pub const MAX_PAGE_CHARS: usize = 15_000;

/// Candidates kept per vendor.
pub const MAX_MATCHES_PER_VENDOR: usize = 5;

#[derive(Debug, Deserialize)]
struct ExtractedProducts {
    #[serde(default)]
    products: Vec<ExtractedProduct>,
}

#[derive(Debug, Deserialize)]
struct ExtractedProduct {
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    product_url: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    match_score: f64,
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Keep the active vendors named in `names` (case-insensitive), or all of them.
fn select_vendors(active: Vec<Vendor>, names: Option<&[String]>) -> Vec<Vendor> {
    match names {
        Some(names) if !names.is_empty() => active
            .into_iter()
            .filter(|v| names.iter().any(|n| n.trim().eq_ignore_ascii_case(&v.name)))
            .collect(),
        _ => active,
    }
}

/// Convert extracted candidates for one vendor into product matches.
fn to_matches(item: &BomItem, vendor: &Vendor, extracted: ExtractedProducts) -> Vec<ProductMatch> {
    let mut matches: Vec<ProductMatch> = extracted
        .products
        .into_iter()
        .filter(|p| !p.product_name.trim().is_empty())
        .map(|p| ProductMatch {
            id: Uuid::new_v4(),
            bom_item_id: item.id,
            vendor_name: vendor.name.clone(),
            product_name: p.product_name.trim().to_string(),
            product_url: p
                .product_url
                .filter(|u| u.starts_with("http://") || u.starts_with("https://")),
            price: p.price.filter(|price| price.is_finite() && *price >= 0.0),
            match_score: if p.match_score.is_finite() {
                p.match_score.clamp(0.0, 1.0)
            } else {
                0.0
            },
            selected: false,
            created_at: Utc::now(),
        })
        .collect();
    matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    matches.truncate(MAX_MATCHES_PER_VENDOR);
    matches
}

/// Searches vendor catalogs and manages the resulting product matches.
pub struct ProductSearcher {
    gateway: Arc<dyn AiGateway>,
    scraper: Arc<dyn PageScraper>,
    store: Arc<Store>,
}

impl ProductSearcher {
    pub fn new(gateway: Arc<dyn AiGateway>, scraper: Arc<dyn PageScraper>, store: Arc<Store>) -> Self {
        Self {
            gateway,
            scraper,
            store,
        }
    }

    /// Search vendors for products matching a BOM item and store the matches.
    ///
    /// A vendor whose page cannot be scraped or extracted is skipped; the
    /// search only fails if every vendor failed.
    pub async fn search(
        &self,
        bom_item_id: Uuid,
        search_query: &str,
        vendor_names: Option<&[String]>,
    ) -> Result<SearchProductsResponse> {
        let query = search_query.trim();
        if query.is_empty() {
            return Err(RenoplanError::InvalidInput("search query cannot be empty".into()));
        }
        let item = self
            .store
            .get_bom_item(bom_item_id)?
            .ok_or_else(|| RenoplanError::not_found("BOM item", bom_item_id))?;

        let vendors = select_vendors(self.store.list_vendors(true)?, vendor_names);
        if vendors.is_empty() {
            tracing::warn!(target: "renoplan::products", "No active vendors to search for item {}", bom_item_id);
            return Ok(SearchProductsResponse {
                match_count: 0,
                matches: Vec::new(),
            });
        }

        let encoded = urlencoding::encode(query);
        let mut matches = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0;

        for vendor in &vendors {
            match self.search_vendor(&item, vendor, query, &encoded).await {
                Ok(found) => {
                    succeeded += 1;
                    matches.extend(found);
                }
                Err(e) => {
                    tracing::warn!(target: "renoplan::products", "Search at {} failed: {}", vendor.name, e);
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        self.store.insert_product_matches(&matches)?;
        tracing::info!(
            target: "renoplan::products",
            "Stored {} matches for item {} from {} vendors",
            matches.len(),
            bom_item_id,
            succeeded
        );

        Ok(SearchProductsResponse {
            match_count: matches.len(),
            matches,
        })
    }

    async fn search_vendor(
        &self,
        item: &BomItem,
        vendor: &Vendor,
        query: &str,
        encoded_query: &str,
    ) -> Result<Vec<ProductMatch>> {
        let url = vendor.search_url(encoded_query);
        let page = self.scraper.scrape(&url).await?;
        if page.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prompt = format!(
            "Item: {} ({} {}, category {})\nSearch query: {}\nVendor: {}\nSearch page URL: {}\n\nPage content:\n{}",
            item.name,
            item.quantity,
            item.unit,
            item.category,
            query,
            vendor.name,
            url,
            truncate_chars(&page, MAX_PAGE_CHARS)
        );
        let turns = [ChatTurn {
            role: MessageRole::User,
            content: prompt,
            image_url: None,
        }];

        let args = self
            .gateway
            .call_tool(PRODUCT_SYSTEM_PROMPT, &turns, &product_tool())
            .await?;
        let extracted: ExtractedProducts = serde_json::from_value(args)
            .map_err(|e| RenoplanError::MalformedResponse(format!("products: {}", e)))?;
        Ok(to_matches(item, vendor, extracted))
    }

    pub fn matches_for_item(&self, bom_item_id: Uuid) -> Result<Vec<ProductMatch>> {
        self.store.list_product_matches(bom_item_id)
    }

    /// Add a match to, or remove it from, the shopping list.
    pub fn set_selected(&self, match_id: Uuid, selected: bool) -> Result<ProductMatch> {
        self.store.set_product_selected(match_id, selected)
    }

    pub fn shopping_list(&self, bom_id: Uuid) -> Result<Vec<ShoppingListEntry>> {
        if self.store.get_bom(bom_id)?.is_none() {
            return Err(RenoplanError::not_found("Bill of materials", bom_id));
        }
        self.store.shopping_list(bom_id)
    }
}
