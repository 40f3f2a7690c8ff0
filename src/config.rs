// src/config.rs
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where inventory data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryMode {
    /// Local SQLite file and template directory; no sign-in required.
    Mock,
    /// SharePoint via Microsoft Graph, on behalf of the signed-in user.
    Live(GraphSettings),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub site_id: String,
    pub list_id: String,
    pub templates_folder: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    pub mode: InventoryMode,
    pub database_path: PathBuf,
    pub schema_path: PathBuf,
    pub templates_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Builds the config from an explicit variable map (used by `from_env` and tests).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
        let required = |name: &'static str| {
            get(name)
                .map(str::to_string)
                .ok_or(ConfigError::Missing(name))
        };

        let bind_raw = get("BIND_ADDR").unwrap_or("127.0.0.1:3000");
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.to_string(),
        })?;

        let max_workers = match get("MAX_WORKERS") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "MAX_WORKERS",
                    value: raw.to_string(),
                })?,
            None => 8,
        };

        let mode = match get("INVENTORY_MODE").unwrap_or("mock") {
            "mock" => InventoryMode::Mock,
            "live" => InventoryMode::Live(GraphSettings {
                tenant_id: required("AZURE_TENANT_ID")?,
                client_id: required("AZURE_CLIENT_ID")?,
                client_secret: required("AZURE_CLIENT_SECRET")?,
                site_id: required("GRAPH_SITE_ID")?,
                list_id: required("GRAPH_LIST_ID")?,
                templates_folder: get("GRAPH_TEMPLATES_FOLDER")
                    .unwrap_or("Templates")
                    .to_string(),
            }),
            other => {
                return Err(ConfigError::Invalid {
                    name: "INVENTORY_MODE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            max_workers,
            mode,
            database_path: get("DATABASE_PATH").unwrap_or("inventory.sqlite3").into(),
            schema_path: get("SCHEMA_PATH").unwrap_or("sql/schema.sql").into(),
            templates_dir: get("TEMPLATES_DIR").unwrap_or("templates").into(),
        })
    }

    pub fn is_live(&self) -> bool {
        matches!(self.mode, InventoryMode::Live(_))
    }
}
