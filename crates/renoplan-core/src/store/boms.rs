use super::{Store, enum_from_sql, enum_to_sql, parse_opt_uuid, parse_time, parse_uuid};
use crate::repo::{BomRepository, ProductMatchRepository};
use crate::{RenoplanError, Result};
use renoplan_types::{
    BillOfMaterials, BomItem, BomStatus, ItemPriority, ProductMatch, ShoppingListEntry,
};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

impl BomRepository for Store {
    fn create_bom(&self, bom: &BillOfMaterials, items: &[BomItem]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO bills_of_material (
                id, project_id, conversation_id, title, total_estimated_cost, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                bom.id.to_string(),
                bom.project_id.to_string(),
                bom.conversation_id.map(|c| c.to_string()),
                bom.title,
                bom.total_estimated_cost,
                enum_to_sql(&bom.status)?,
                bom.created_at.to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO bom_items (
                    id, bom_id, position, category, name, description, quantity, unit,
                    estimated_unit_price, estimated_total_price, priority, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;
            for (position, item) in items.iter().enumerate() {
                if item.bom_id != bom.id {
                    return Err(RenoplanError::InvalidInput(format!(
                        "item {} does not belong to BOM {}",
                        item.id, bom.id
                    )));
                }
                stmt.execute(params![
                    item.id.to_string(),
                    item.bom_id.to_string(),
                    position as i64,
                    item.category,
                    item.name,
                    item.description,
                    item.quantity,
                    item.unit,
                    item.estimated_unit_price,
                    item.estimated_total_price,
                    enum_to_sql(&item.priority)?,
                    item.notes,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_bom(&self, id: Uuid) -> Result<Option<BillOfMaterials>> {
        let conn = self.conn()?;
        let bom = conn
            .query_row(
                "SELECT * FROM bills_of_material WHERE id = ?1",
                params![id.to_string()],
                row_to_bom,
            )
            .optional()?;
        Ok(bom)
    }

    fn list_boms(&self, project_id: Uuid) -> Result<Vec<BillOfMaterials>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM bills_of_material WHERE project_id = ?1 ORDER BY created_at DESC",
        )?;
        let boms = stmt
            .query_map(params![project_id.to_string()], row_to_bom)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(boms)
    }

    fn list_bom_items(&self, bom_id: Uuid) -> Result<Vec<BomItem>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM bom_items WHERE bom_id = ?1 ORDER BY position ASC")?;
        let items = stmt
            .query_map(params![bom_id.to_string()], row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn get_bom_item(&self, id: Uuid) -> Result<Option<BomItem>> {
        let conn = self.conn()?;
        let item = conn
            .query_row(
                "SELECT * FROM bom_items WHERE id = ?1",
                params![id.to_string()],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn set_bom_status(&self, id: Uuid, status: BomStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE bills_of_material SET status = ?1 WHERE id = ?2",
            params![enum_to_sql(&status)?, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RenoplanError::not_found("Bill of materials", id));
        }
        Ok(())
    }
}

impl ProductMatchRepository for Store {
    fn insert_product_matches(&self, matches: &[ProductMatch]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO product_matches (
                    id, bom_item_id, vendor_name, product_name, product_url, price,
                    match_score, selected, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for m in matches {
                stmt.execute(params![
                    m.id.to_string(),
                    m.bom_item_id.to_string(),
                    m.vendor_name,
                    m.product_name,
                    m.product_url,
                    m.price,
                    m.match_score,
                    m.selected,
                    m.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_product_match(&self, id: Uuid) -> Result<Option<ProductMatch>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT * FROM product_matches WHERE id = ?1",
                params![id.to_string()],
                row_to_match,
            )
            .optional()?;
        Ok(found)
    }

    fn list_product_matches(&self, bom_item_id: Uuid) -> Result<Vec<ProductMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM product_matches
            WHERE bom_item_id = ?1
            ORDER BY match_score DESC, created_at ASC
            "#,
        )?;
        let matches = stmt
            .query_map(params![bom_item_id.to_string()], row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn set_product_selected(&self, id: Uuid, selected: bool) -> Result<ProductMatch> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE product_matches SET selected = ?1 WHERE id = ?2",
            params![selected, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RenoplanError::not_found("Product match", id));
        }
        let updated = conn.query_row(
            "SELECT * FROM product_matches WHERE id = ?1",
            params![id.to_string()],
            row_to_match,
        )?;
        Ok(updated)
    }

    fn shopping_list(&self, bom_id: Uuid) -> Result<Vec<ShoppingListEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                i.*,
                m.id AS m_id, m.bom_item_id AS m_bom_item_id, m.vendor_name AS m_vendor_name,
                m.product_name AS m_product_name, m.product_url AS m_product_url,
                m.price AS m_price, m.match_score AS m_match_score,
                m.selected AS m_selected, m.created_at AS m_created_at
            FROM product_matches m
            JOIN bom_items i ON i.id = m.bom_item_id
            WHERE i.bom_id = ?1 AND m.selected = 1
            ORDER BY i.position ASC, m.match_score DESC
            "#,
        )?;
        let entries = stmt
            .query_map(params![bom_id.to_string()], |row| {
                let created_at: String = row.get("m_created_at")?;
                let id: String = row.get("m_id")?;
                let bom_item_id: String = row.get("m_bom_item_id")?;
                Ok(ShoppingListEntry {
                    item: row_to_item(row)?,
                    product: ProductMatch {
                        id: parse_uuid(&id),
                        bom_item_id: parse_uuid(&bom_item_id),
                        vendor_name: row.get("m_vendor_name")?,
                        product_name: row.get("m_product_name")?,
                        product_url: row.get("m_product_url")?,
                        price: row.get("m_price")?,
                        match_score: row.get("m_match_score")?,
                        selected: row.get("m_selected")?,
                        created_at: parse_time(&created_at),
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn row_to_bom(row: &rusqlite::Row) -> rusqlite::Result<BillOfMaterials> {
    let id: String = row.get("id")?;
    let project_id: String = row.get("project_id")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;

    Ok(BillOfMaterials {
        id: parse_uuid(&id),
        project_id: parse_uuid(&project_id),
        conversation_id: parse_opt_uuid(row.get("conversation_id")?),
        title: row.get("title")?,
        total_estimated_cost: row.get("total_estimated_cost")?,
        status: enum_from_sql(&status).unwrap_or(BomStatus::Draft),
        created_at: parse_time(&created_at),
    })
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<BomItem> {
    let id: String = row.get("id")?;
    let bom_id: String = row.get("bom_id")?;
    let priority: String = row.get("priority")?;

    Ok(BomItem {
        id: parse_uuid(&id),
        bom_id: parse_uuid(&bom_id),
        category: row.get("category")?,
        name: row.get("name")?,
        description: row.get("description")?,
        quantity: row.get("quantity")?,
        unit: row.get("unit")?,
        estimated_unit_price: row.get("estimated_unit_price")?,
        estimated_total_price: row.get("estimated_total_price")?,
        priority: enum_from_sql(&priority).unwrap_or(ItemPriority::Recommended),
        notes: row.get("notes")?,
    })
}

fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<ProductMatch> {
    let id: String = row.get("id")?;
    let bom_item_id: String = row.get("bom_item_id")?;
    let created_at: String = row.get("created_at")?;

    Ok(ProductMatch {
        id: parse_uuid(&id),
        bom_item_id: parse_uuid(&bom_item_id),
        vendor_name: row.get("vendor_name")?,
        product_name: row.get("product_name")?,
        product_url: row.get("product_url")?,
        price: row.get("price")?,
        match_score: row.get("match_score")?,
        selected: row.get("selected")?,
        created_at: parse_time(&created_at),
    })
}
