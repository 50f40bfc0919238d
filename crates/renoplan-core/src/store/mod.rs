//! SQLite persistence for conversations, projects, BOMs and vendors.
//!
//! [`Store`] implements every repository trait in [`crate::repo`] over a
//! single connection.

mod boms;
mod conversations;
mod projects;
mod vendors;

use crate::{RenoplanError, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// SQLite-backed store.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RenoplanError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                user_id TEXT,
                project_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id, updated_at);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                image_url TEXT,
                created_at TEXT NOT NULL,
                seq INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, seq);

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                budget REAL,
                phase TEXT NOT NULL,
                key_features TEXT NOT NULL DEFAULT '[]',
                materials_mentioned TEXT NOT NULL DEFAULT '[]',
                style_preferences TEXT NOT NULL DEFAULT '[]',
                budget_estimate REAL,
                timeline_weeks INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);

            CREATE TABLE IF NOT EXISTS bills_of_material (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                conversation_id TEXT,
                title TEXT NOT NULL,
                total_estimated_cost REAL NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_boms_project ON bills_of_material(project_id);

            CREATE TABLE IF NOT EXISTS bom_items (
                id TEXT PRIMARY KEY,
                bom_id TEXT NOT NULL REFERENCES bills_of_material(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                category TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                quantity REAL NOT NULL,
                unit TEXT NOT NULL,
                estimated_unit_price REAL NOT NULL,
                estimated_total_price REAL NOT NULL,
                priority TEXT NOT NULL,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_bom_items_bom ON bom_items(bom_id, position);

            CREATE TABLE IF NOT EXISTS product_matches (
                id TEXT PRIMARY KEY,
                bom_item_id TEXT NOT NULL REFERENCES bom_items(id) ON DELETE CASCADE,
                vendor_name TEXT NOT NULL,
                product_name TEXT NOT NULL,
                product_url TEXT,
                price REAL,
                match_score REAL NOT NULL,
                selected INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_product_matches_item ON product_matches(bom_item_id);

            CREATE TABLE IF NOT EXISTS vendors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                search_url_template TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, role)
            );
            "#,
        )?;
        Ok(())
    }
}

/// Store an enum by its serde name (e.g. `in_progress`).
fn enum_to_sql<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn enum_from_sql<T: DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_default()
}

fn parse_opt_uuid(s: Option<String>) -> Option<Uuid> {
    s.and_then(|s| Uuid::parse_str(&s).ok())
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn list_to_sql(items: &[String]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

fn list_from_sql(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
