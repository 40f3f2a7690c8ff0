//! Inventory backends: a local SQLite store and SharePoint through Microsoft Graph.

pub mod graph;
pub mod local;

use crate::auth::Caller;
use crate::domain::{DomainField, InventoryItem, VersionSnapshot, STATUS_DEPLOYED, STATUS_READY};
use crate::errors::ServerError;

/// What the app needs from wherever the inventory list lives.
///
/// Every call carries the caller so live backends can act on their behalf.
pub trait Inventory: Send + Sync {
    fn search(&self, caller: &Caller, query: &str) -> Result<Vec<InventoryItem>, ServerError>;

    fn item(&self, caller: &Caller, id: &str) -> Result<Option<InventoryItem>, ServerError>;

    /// Stored versions of an item, newest first.
    fn versions(&self, caller: &Caller, id: &str) -> Result<Vec<VersionSnapshot>, ServerError>;

    fn update(
        &self,
        caller: &Caller,
        id: &str,
        changes: &[(DomainField, Option<String>)],
    ) -> Result<InventoryItem, ServerError>;

    /// Raw bytes of the named PDF form template.
    fn template(&self, caller: &Caller, name: &str) -> Result<Vec<u8>, ServerError>;

    /// Whether requests must carry a bearer token.
    fn requires_sign_in(&self) -> bool {
        false
    }
}

/// Field changes for handing an item to `to`.
pub fn check_out_changes(to: &str) -> Vec<(DomainField, Option<String>)> {
    vec![
        (DomainField::Status, Some(STATUS_DEPLOYED.to_string())),
        (DomainField::UserLocation, Some(to.trim().to_string())),
    ]
}

/// Field changes for returning an item to stock.
pub fn check_in_changes() -> Vec<(DomainField, Option<String>)> {
    vec![
        (DomainField::Status, Some(STATUS_READY.to_string())),
        (DomainField::UserLocation, None),
    ]
}

pub fn check_out(
    inventory: &dyn Inventory,
    caller: &Caller,
    id: &str,
    to: &str,
) -> Result<InventoryItem, ServerError> {
    if to.trim().is_empty() {
        return Err(ServerError::BadRequest("check-out needs a recipient".into()));
    }
    let item = inventory.update(caller, id, &check_out_changes(to))?;
    log::info!("item {id} checked out to {} by {}", to.trim(), caller.display_name);
    Ok(item)
}

pub fn check_in(
    inventory: &dyn Inventory,
    caller: &Caller,
    id: &str,
) -> Result<InventoryItem, ServerError> {
    let item = inventory.update(caller, id, &check_in_changes())?;
    log::info!("item {id} checked in by {}", caller.display_name);
    Ok(item)
}
