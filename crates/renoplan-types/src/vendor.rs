//! Vendor catalog configuration and user roles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder replaced with the encoded search query in vendor templates.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// An admin-configured vendor whose catalog can be searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    /// Search page URL containing `{query}`.
    pub search_url_template: String,
    /// Lower numbers are searched first.
    pub priority: i32,
    pub active: bool,
}

impl Vendor {
    /// Build the search URL for a query. The query is percent-encoded.
    pub fn search_url(&self, encoded_query: &str) -> String {
        self.search_url_template
            .replace(QUERY_PLACEHOLDER, encoded_query)
    }
}

/// Fields for creating or replacing a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorInput {
    pub name: String,
    pub search_url_template: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Application role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
    User,
}

impl AppRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::Admin => "admin",
            AppRole::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(AppRole::Admin),
            "user" => Some(AppRole::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: AppRole,
}
