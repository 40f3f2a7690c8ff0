use crate::config::{AppConfig, InventoryMode};
use crate::db::{init_db, Database};
use crate::inventory::graph::GraphInventory;
use crate::inventory::local::LocalInventory;
use crate::inventory::Inventory;
use crate::router::{respond, AppState};
use astra::Server;
use env_logger::Env;

mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod forms;
mod graph;
mod inventory;
mod responses;
mod router;
mod spreadsheets;
mod templates;

#[cfg(test)]
mod tests;

fn build_inventory(config: &AppConfig) -> Result<Box<dyn Inventory>, String> {
    match &config.mode {
        InventoryMode::Mock => {
            let db = Database::new(&config.database_path);
            init_db(&db, &config.schema_path).map_err(|e| format!("Database initialization failed: {e}"))?;
            log::info!(
                "mock inventory: {} (templates in {})",
                config.database_path.display(),
                config.templates_dir.display()
            );
            Ok(Box::new(LocalInventory::new(db, &config.templates_dir)))
        }
        InventoryMode::Live(settings) => {
            log::info!("live inventory: site {} list {}", settings.site_id, settings.list_id);
            let inventory = GraphInventory::new(settings).map_err(|e| e.to_string())?;
            Ok(Box::new(inventory))
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let inventory = match build_inventory(&config) {
        Ok(inventory) => inventory,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr;
    let server = Server::bind(&addr).max_workers(config.max_workers);
    let state = AppState { inventory };

    log::info!(
        "Starting server at http://{addr} ({} mode)",
        if config.is_live() { "live" } else { "mock" }
    );

    let result = server.serve(move |req, _info| respond(req, &state));

    if let Err(e) = result {
        log::error!("Server ended with error: {e}");
    }

    log::info!("Server shut down cleanly.");
}
