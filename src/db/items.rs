use crate::db::connection::Database;
use crate::domain::{DomainField, InventoryItem, VersionSnapshot};
use crate::errors::ServerError;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

const ITEM_COLUMNS: &str =
    "id, title, serial_number, model, user_location, status, asset_image, notes, modified, modified_by";

/// Column holding a domain field in the `items` table.
fn column(field: DomainField) -> &'static str {
    match field {
        DomainField::Asset => "title",
        DomainField::Serial => "serial_number",
        DomainField::Model => "model",
        DomainField::UserLocation => "user_location",
        DomainField::Status => "status",
        DomainField::AssetImage => "asset_image",
        DomainField::Notes => "notes",
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get::<_, i64>(0)?.to_string(),
        asset: row.get(1)?,
        serial: row.get(2)?,
        model: row.get(3)?,
        user_location: row.get(4)?,
        status: row.get(5)?,
        asset_image: row.get(6)?,
        notes: row.get(7)?,
        modified: row.get(8)?,
        modified_by: row.get(9)?,
    })
}

fn load_item(conn: &Connection, id: i64) -> Result<Option<InventoryItem>, ServerError> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
        params![id],
        row_to_item,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

fn record_version(conn: &Connection, item: &InventoryItem, item_id: i64) -> Result<(), ServerError> {
    let fields_json = Value::Object(item.to_fields()).to_string();
    conn.execute(
        "INSERT INTO item_versions (item_id, modified, modified_by, fields_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![item_id, item.modified, item.modified_by, fields_json],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

/// Items whose asset, serial or model contains `query` (case-insensitive).
/// An empty query lists everything.
pub fn search_items(db: &Database, query: &str) -> Result<Vec<InventoryItem>, ServerError> {
    let needle = query.trim().to_lowercase();

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM items
                 WHERE instr(lower(coalesce(title, '')), ?1) > 0
                    OR instr(lower(coalesce(serial_number, '')), ?1) > 0
                    OR instr(lower(coalesce(model, '')), ?1) > 0
                 ORDER BY title COLLATE NOCASE, id"
            ))
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params![needle], row_to_item)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

pub fn get_item(db: &Database, id: i64) -> Result<Option<InventoryItem>, ServerError> {
    db.with_conn(|conn| load_item(conn, id))
}

/// Saved versions of an item, newest first.
pub fn item_versions(db: &Database, id: i64) -> Result<Vec<VersionSnapshot>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                "SELECT modified, modified_by, fields_json FROM item_versions
                 WHERE item_id = ?1
                 ORDER BY id DESC",
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            let (modified, modified_by, fields_json) =
                r.map_err(|e| ServerError::DbError(e.to_string()))?;
            let fields: Map<String, Value> = serde_json::from_str(&fields_json)
                .map_err(|e| ServerError::DbError(format!("Corrupt version row: {e}")))?;
            out.push(VersionSnapshot {
                modified,
                modified_by,
                fields,
            });
        }
        Ok(out)
    })
}

/// Inserts a new item and its first version.
pub fn insert_item(
    db: &Database,
    values: &[(DomainField, Option<String>)],
    modified_by: &str,
) -> Result<InventoryItem, ServerError> {
    let mut item = InventoryItem::default();
    for (field, value) in values {
        item.set(*field, value.clone());
    }
    item.modified = Some(now_stamp());
    item.modified_by = Some(modified_by.to_string());

    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO items (title, serial_number, model, user_location, status, asset_image, notes, modified, modified_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.asset,
                item.serial,
                item.model,
                item.user_location,
                item.status,
                item.asset_image,
                item.notes,
                item.modified,
                item.modified_by,
            ],
        )?;
        let id = tx.last_insert_rowid();
        item.id = id.to_string();
        record_version(&tx, &item, id)?;
        tx.commit()?;
        Ok(item)
    })
}

/// Applies `changes` to an item and records the result as a new version.
pub fn update_item(
    db: &Database,
    id: i64,
    changes: &[(DomainField, Option<String>)],
    modified_by: &str,
) -> Result<InventoryItem, ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut item = load_item(&tx, id)?.ok_or(ServerError::NotFound)?;

        for (field, value) in changes {
            item.set(*field, value.clone());
            tx.execute(
                &format!("UPDATE items SET {} = ?1 WHERE id = ?2", column(*field)),
                params![item.get(*field), id],
            )?;
        }

        item.modified = Some(now_stamp());
        item.modified_by = Some(modified_by.to_string());
        tx.execute(
            "UPDATE items SET modified = ?1, modified_by = ?2 WHERE id = ?3",
            params![item.modified, item.modified_by, id],
        )?;

        record_version(&tx, &item, id)?;
        tx.commit()?;
        Ok(item)
    })
}
