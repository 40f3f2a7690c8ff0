// src/graph/client.rs

use crate::domain::{InventoryItem, VersionSnapshot};
use crate::errors::ServerError;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

pub const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0/";

#[derive(Deserialize)]
struct Page<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdentitySet {
    user: Option<Identity>,
}

impl IdentitySet {
    fn display_name(&self) -> Option<String> {
        self.user.as_ref().and_then(|u| u.display_name.clone())
    }
}

/// A SharePoint list item as Graph returns it with `$expand=fields`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    last_modified_date_time: Option<String>,
    #[serde(default)]
    last_modified_by: IdentitySet,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ListItem {
    pub fn into_item(self) -> InventoryItem {
        let modified_by = self.last_modified_by.display_name();
        InventoryItem::from_fields(self.id, &self.fields, self.last_modified_date_time, modified_by)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItemVersion {
    last_modified_date_time: String,
    #[serde(default)]
    last_modified_by: IdentitySet,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl From<ListItemVersion> for VersionSnapshot {
    fn from(v: ListItemVersion) -> Self {
        VersionSnapshot {
            modified_by: v.last_modified_by.display_name(),
            modified: v.last_modified_date_time,
            fields: v.fields,
        }
    }
}

#[derive(Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Deserialize)]
struct GraphErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Maps a failed Graph or token-endpoint answer to a server error.
///
/// Both Graph's `{"error":{"code","message"}}` body and the token endpoint's
/// `error_description` are understood; anything else is passed through.
pub fn upstream_error(status: u16, body: &str) -> ServerError {
    let message = serde_json::from_str::<GraphErrorBody>(body)
        .ok()
        .and_then(|b| {
            match (b.error.code, b.error.message) {
                (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
                (code, msg) => msg.or(code),
            }
        })
        .or_else(|| {
            serde_json::from_str::<Map<String, Value>>(body)
                .ok()
                .and_then(|m| m.get("error_description").and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "(no body)".to_string()
            } else {
                trimmed.to_string()
            }
        });

    ServerError::Upstream { status, message }
}

/// Thin blocking client for the handful of Graph endpoints the inventory uses.
pub struct GraphClient {
    http: Client,
    base: Url,
    site_id: String,
    list_id: String,
    templates_folder: String,
}

impl GraphClient {
    pub fn new(http: Client, site_id: String, list_id: String, templates_folder: String) -> Result<Self, ServerError> {
        let base = Url::parse(GRAPH_BASE).map_err(|_| ServerError::InternalError)?;
        Ok(Self {
            http,
            base,
            site_id,
            list_id,
            templates_folder,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ServerError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServerError::InternalError)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn items_url(&self) -> Result<Url, ServerError> {
        let mut url = self.url(&["sites", &self.site_id, "lists", &self.list_id, "items"])?;
        url.query_pairs_mut().append_pair("$expand", "fields");
        Ok(url)
    }

    pub fn item_url(&self, id: &str) -> Result<Url, ServerError> {
        let mut url = self.url(&["sites", &self.site_id, "lists", &self.list_id, "items", id])?;
        url.query_pairs_mut().append_pair("$expand", "fields");
        Ok(url)
    }

    pub fn versions_url(&self, id: &str) -> Result<Url, ServerError> {
        let mut url = self.url(&[
            "sites", &self.site_id, "lists", &self.list_id, "items", id, "versions",
        ])?;
        url.query_pairs_mut().append_pair("$expand", "fields");
        Ok(url)
    }

    pub fn fields_url(&self, id: &str) -> Result<Url, ServerError> {
        self.url(&["sites", &self.site_id, "lists", &self.list_id, "items", id, "fields"])
    }

    /// `/sites/{site}/drive/root:/{folder}/{name}.pdf:/content`
    pub fn template_url(&self, name: &str) -> Result<Url, ServerError> {
        let file = format!("{name}.pdf:");
        let mut segments = vec!["sites", self.site_id.as_str(), "drive", "root:"];
        segments.extend(self.templates_folder.split('/').filter(|s| !s.is_empty()));
        segments.push(&file);
        segments.push("content");
        self.url(&segments)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ServerError> {
        let response = request.send().map_err(|e| ServerError::Upstream {
            status: 502,
            message: format!("Graph request failed: {e}"),
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let text = response.text().unwrap_or_default();
            log::warn!("Graph answered {status}");
            Err(upstream_error(status.as_u16(), &text))
        }
    }

    fn get_json<T: DeserializeOwned>(&self, token: &str, url: &str) -> Result<T, ServerError> {
        self.send(self.http.get(url).bearer_auth(token))?
            .json()
            .map_err(|e| ServerError::Upstream {
                status: 502,
                message: format!("unreadable Graph response: {e}"),
            })
    }

    // Follows @odata.nextLink until the collection is exhausted.
    fn get_all<T: DeserializeOwned>(&self, token: &str, first: Url) -> Result<Vec<T>, ServerError> {
        let mut out = Vec::new();
        let mut next = Some(first.to_string());
        while let Some(url) = next {
            let page: Page<T> = self.get_json(token, &url)?;
            out.extend(page.value);
            next = page.next_link;
        }
        Ok(out)
    }

    pub fn list_items(&self, token: &str) -> Result<Vec<ListItem>, ServerError> {
        self.get_all(token, self.items_url()?)
    }

    /// `None` when Graph reports the item missing.
    pub fn list_item(&self, token: &str, id: &str) -> Result<Option<ListItem>, ServerError> {
        match self.get_json(token, self.item_url(id)?.as_str()) {
            Ok(item) => Ok(Some(item)),
            Err(ServerError::Upstream { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn item_versions(&self, token: &str, id: &str) -> Result<Vec<VersionSnapshot>, ServerError> {
        let versions: Vec<ListItemVersion> = match self.get_all(token, self.versions_url(id)?) {
            Err(ServerError::Upstream { status: 404, .. }) => return Err(ServerError::NotFound),
            other => other?,
        };
        Ok(versions.into_iter().map(VersionSnapshot::from).collect())
    }

    /// PATCHes the item's field set; `null` clears a column.
    pub fn update_fields(&self, token: &str, id: &str, fields: &Map<String, Value>) -> Result<(), ServerError> {
        let request = self
            .http
            .patch(self.fields_url(id)?)
            .bearer_auth(token)
            .json(fields);
        match self.send(request) {
            Ok(_) => Ok(()),
            Err(ServerError::Upstream { status: 404, .. }) => Err(ServerError::NotFound),
            Err(e) => Err(e),
        }
    }

    pub fn download_template(&self, token: &str, name: &str) -> Result<Vec<u8>, ServerError> {
        let request = self.http.get(self.template_url(name)?).bearer_auth(token);
        let response = match self.send(request) {
            Err(ServerError::Upstream { status: 404, .. }) => return Err(ServerError::NotFound),
            other => other?,
        };
        let bytes = response.bytes().map_err(|e| ServerError::Upstream {
            status: 502,
            message: format!("template download interrupted: {e}"),
        })?;
        Ok(bytes.to_vec())
    }
}
