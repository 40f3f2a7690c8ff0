use crate::auth::Caller;
use crate::config::GraphSettings;
use crate::domain::{DomainField, InventoryItem, VersionSnapshot};
use crate::errors::ServerError;
use crate::graph::{GraphClient, OboExchanger};
use crate::inventory::Inventory;
use reqwest::blocking::Client;
use serde_json::{Map, Value};

/// The SharePoint list, reached through Graph as the signed-in caller.
pub struct GraphInventory {
    graph: GraphClient,
    obo: OboExchanger,
}

impl GraphInventory {
    pub fn new(settings: &GraphSettings) -> Result<Self, ServerError> {
        let http = Client::new();
        Ok(Self {
            graph: GraphClient::new(
                http.clone(),
                settings.site_id.clone(),
                settings.list_id.clone(),
                settings.templates_folder.clone(),
            )?,
            obo: OboExchanger::new(
                settings.tenant_id.clone(),
                settings.client_id.clone(),
                settings.client_secret.clone(),
                http,
            ),
        })
    }

    fn token(&self, caller: &Caller) -> Result<String, ServerError> {
        self.obo.exchange(caller.bearer()?)
    }
}

/// PATCH body for a set of changes; cleared fields are sent as null.
pub fn patch_body(changes: &[(DomainField, Option<String>)]) -> Map<String, Value> {
    changes
        .iter()
        .map(|(field, value)| {
            let value = value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null);
            (field.storage_key().to_string(), value)
        })
        .collect()
}

impl Inventory for GraphInventory {
    fn search(&self, caller: &Caller, query: &str) -> Result<Vec<InventoryItem>, ServerError> {
        let token = self.token(caller)?;
        let mut items: Vec<InventoryItem> = self
            .graph
            .list_items(&token)?
            .into_iter()
            .map(|li| li.into_item())
            .filter(|item| item.matches(query))
            .collect();
        items.sort_by_key(|i| i.asset.clone().unwrap_or_default().to_lowercase());
        Ok(items)
    }

    fn item(&self, caller: &Caller, id: &str) -> Result<Option<InventoryItem>, ServerError> {
        let token = self.token(caller)?;
        Ok(self.graph.list_item(&token, id)?.map(|li| li.into_item()))
    }

    fn versions(&self, caller: &Caller, id: &str) -> Result<Vec<VersionSnapshot>, ServerError> {
        let token = self.token(caller)?;
        self.graph.item_versions(&token, id)
    }

    fn update(
        &self,
        caller: &Caller,
        id: &str,
        changes: &[(DomainField, Option<String>)],
    ) -> Result<InventoryItem, ServerError> {
        let token = self.token(caller)?;
        self.graph.update_fields(&token, id, &patch_body(changes))?;
        self.graph
            .list_item(&token, id)?
            .map(|li| li.into_item())
            .ok_or(ServerError::NotFound)
    }

    fn template(&self, caller: &Caller, name: &str) -> Result<Vec<u8>, ServerError> {
        let token = self.token(caller)?;
        self.graph.download_template(&token, name)
    }

    fn requires_sign_in(&self) -> bool {
        true
    }
}
