use super::{Store, parse_uuid};
use crate::repo::{UserRoleRepository, VendorRepository};
use crate::{RenoplanError, Result};
use renoplan_types::{AppRole, QUERY_PLACEHOLDER, Vendor, VendorInput};
use rusqlite::params;
use uuid::Uuid;

fn validate(input: &VendorInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(RenoplanError::InvalidInput("vendor name cannot be empty".into()));
    }
    if !input.search_url_template.contains(QUERY_PLACEHOLDER) {
        return Err(RenoplanError::InvalidInput(format!(
            "search URL template must contain {}",
            QUERY_PLACEHOLDER
        )));
    }
    if !input.search_url_template.starts_with("http://")
        && !input.search_url_template.starts_with("https://")
    {
        return Err(RenoplanError::InvalidInput(
            "search URL template must be an http(s) URL".into(),
        ));
    }
    Ok(())
}

impl VendorRepository for Store {
    fn list_vendors(&self, active_only: bool) -> Result<Vec<Vendor>> {
        let conn = self.conn()?;
        let sql = if active_only {
            "SELECT * FROM vendors WHERE active = 1 ORDER BY priority ASC, name ASC"
        } else {
            "SELECT * FROM vendors ORDER BY priority ASC, name ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let vendors = stmt
            .query_map([], row_to_vendor)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(vendors)
    }

    fn create_vendor(&self, input: &VendorInput) -> Result<Vendor> {
        validate(input)?;
        let vendor = Vendor {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            search_url_template: input.search_url_template.clone(),
            priority: input.priority,
            active: input.active,
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO vendors (id, name, search_url_template, priority, active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vendor.id.to_string(),
                vendor.name,
                vendor.search_url_template,
                vendor.priority,
                vendor.active,
            ],
        )?;
        Ok(vendor)
    }

    fn update_vendor(&self, id: Uuid, input: &VendorInput) -> Result<Vendor> {
        validate(input)?;
        let vendor = Vendor {
            id,
            name: input.name.trim().to_string(),
            search_url_template: input.search_url_template.clone(),
            priority: input.priority,
            active: input.active,
        };
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE vendors SET name = ?1, search_url_template = ?2, priority = ?3, active = ?4
            WHERE id = ?5
            "#,
            params![
                vendor.name,
                vendor.search_url_template,
                vendor.priority,
                vendor.active,
                id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RenoplanError::not_found("Vendor", id));
        }
        Ok(vendor)
    }

    fn delete_vendor(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM vendors WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }
}

impl UserRoleRepository for Store {
    fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool> {
        let conn = self.conn()?;
        let found: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM user_roles WHERE user_id = ?1 AND role = ?2",
            params![user_id.to_string(), role.as_str()],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn grant_role(&self, user_id: Uuid, role: AppRole) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
            params![user_id.to_string(), role.as_str()],
        )?;
        Ok(())
    }

    fn revoke_role(&self, user_id: Uuid, role: AppRole) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM user_roles WHERE user_id = ?1 AND role = ?2",
            params![user_id.to_string(), role.as_str()],
        )?;
        Ok(changed > 0)
    }
}

fn row_to_vendor(row: &rusqlite::Row) -> rusqlite::Result<Vendor> {
    let id: String = row.get("id")?;
    Ok(Vendor {
        id: parse_uuid(&id),
        name: row.get("name")?,
        search_url_template: row.get("search_url_template")?,
        priority: row.get("priority")?,
        active: row.get("active")?,
    })
}
