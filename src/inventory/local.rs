use crate::auth::Caller;
use crate::db::{items, Database};
use crate::domain::{DomainField, InventoryItem, VersionSnapshot};
use crate::errors::ServerError;
use crate::inventory::Inventory;
use std::path::PathBuf;

/// SQLite inventory plus a directory of `<name>.pdf` templates.
pub struct LocalInventory {
    db: Database,
    templates_dir: PathBuf,
}

impl LocalInventory {
    pub fn new(db: Database, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            templates_dir: templates_dir.into(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

// Local ids are row ids; anything else cannot exist.
fn row_id(id: &str) -> Option<i64> {
    id.trim().parse().ok()
}

/// Template names map to file names; path separators are refused.
fn template_file_name(name: &str) -> Result<String, ServerError> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ServerError::BadRequest(format!("invalid template name: {name:?}")));
    }
    Ok(format!("{name}.pdf"))
}

impl Inventory for LocalInventory {
    fn search(&self, _caller: &Caller, query: &str) -> Result<Vec<InventoryItem>, ServerError> {
        items::search_items(&self.db, query)
    }

    fn item(&self, _caller: &Caller, id: &str) -> Result<Option<InventoryItem>, ServerError> {
        match row_id(id) {
            Some(id) => items::get_item(&self.db, id),
            None => Ok(None),
        }
    }

    fn versions(&self, _caller: &Caller, id: &str) -> Result<Vec<VersionSnapshot>, ServerError> {
        match row_id(id) {
            Some(id) => items::item_versions(&self.db, id),
            None => Ok(Vec::new()),
        }
    }

    fn update(
        &self,
        caller: &Caller,
        id: &str,
        changes: &[(DomainField, Option<String>)],
    ) -> Result<InventoryItem, ServerError> {
        let id = row_id(id).ok_or(ServerError::NotFound)?;
        items::update_item(&self.db, id, changes, &caller.display_name)
    }

    fn template(&self, _caller: &Caller, name: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.templates_dir.join(template_file_name(name)?);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("template not found: {}", path.display());
                Err(ServerError::NotFound)
            }
            Err(e) => {
                log::error!("reading template {} failed: {e}", path.display());
                Err(ServerError::InternalError)
            }
        }
    }
}
