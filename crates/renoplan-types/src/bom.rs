//! Bill of materials, line items and product matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a bill of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BomStatus {
    #[default]
    Draft,
    Pending,
    Approved,
}

/// How important a line item is to the renovation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPriority {
    Essential,
    #[default]
    Recommended,
    Optional,
}

/// A generated bill of materials for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    pub title: String,
    /// Sum of item totals at generation time. Never recomputed.
    pub total_estimated_cost: f64,
    pub status: BomStatus,
    pub created_at: DateTime<Utc>,
}

/// One categorized line of a bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomItem {
    pub id: Uuid,
    pub bom_id: Uuid,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub estimated_unit_price: f64,
    pub estimated_total_price: f64,
    pub priority: ItemPriority,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A BOM together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomDetail {
    #[serde(flatten)]
    pub bom: BillOfMaterials,
    pub items: Vec<BomItem>,
}

/// A vendor product proposed for one BOM item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub id: Uuid,
    pub bom_item_id: Uuid,
    pub vendor_name: String,
    pub product_name: String,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Relevance in `0.0..=1.0`.
    pub match_score: f64,
    /// Sole membership test for the shopping list.
    pub selected: bool,
    pub created_at: DateTime<Utc>,
}

/// A selected product match and the line item it fulfils.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListEntry {
    pub item: BomItem,
    pub product: ProductMatch,
}

/// Line total for a quantity and unit price.
pub fn line_total(quantity: f64, unit_price: f64) -> f64 {
    quantity * unit_price
}

/// Total estimated cost of a set of items, as quantity times unit price summed.
pub fn total_estimated_cost(items: &[BomItem]) -> f64 {
    items
        .iter()
        .map(|i| line_total(i.quantity, i.estimated_unit_price))
        .sum()
}
