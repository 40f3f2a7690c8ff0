use crate::db::items::insert_item;
use crate::db::{init_db, Database};
use crate::domain::{DomainField, InventoryItem, STATUS_READY};
use crate::forms::test_support::{form_pdf, FixtureField};
use crate::forms::BLANK_HAND_RECEIPT;
use crate::inventory::local::LocalInventory;
use crate::router::AppState;
use astra::{Body, Request, Response};
use http::Method;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{nanos}_{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// A fresh SQLite path under the system temp dir.
pub fn temp_db_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{label}_test_{}.sqlite", unique_suffix()))
}

/// Initialize a fresh test DB using the production schema
pub fn init_test_db(label: &str) -> Database {
    let db = Database::new(temp_db_path(label));
    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

// Header fields plus the first two line slots.
const RECEIPT_FIELDS: [&str; 17] = [
    "FROM",
    "TO",
    "DATE",
    "REP NAME",
    "REP PHONE",
    "SIGNATURE",
    "REMARKS",
    "ASSET 1",
    "MODEL 1",
    "SERIAL/ASSET NO 1",
    "QTY 1",
    "UNIT 1",
    "ASSET 2",
    "MODEL 2",
    "SERIAL/ASSET NO 2",
    "QTY 2",
    "UNIT 2",
];

/// Template directory holding a "Blank Hand Receipt".
pub fn temp_templates_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{label}_templates_{}", unique_suffix()));
    std::fs::create_dir_all(&dir).unwrap();

    let fields: Vec<FixtureField> = RECEIPT_FIELDS.into_iter().map(FixtureField::Text).collect();
    std::fs::write(dir.join(format!("{BLANK_HAND_RECEIPT}.pdf")), form_pdf(&fields)).unwrap();
    dir
}

/// App state backed by a fresh local inventory, plus a handle for seeding it.
pub fn test_state(label: &str) -> (AppState, Database) {
    let db = init_test_db(label);
    let templates_dir = temp_templates_dir(label);
    let state = AppState {
        inventory: Box::new(LocalInventory::new(db.clone(), templates_dir)),
    };
    (state, db)
}

pub fn seed_item(db: &Database, asset: &str, serial: &str, model: &str) -> InventoryItem {
    insert_item(
        db,
        &[
            (DomainField::Asset, Some(asset.to_string())),
            (DomainField::Serial, Some(serial.to_string())),
            (DomainField::Model, Some(model.to_string())),
            (DomainField::Status, Some(STATUS_READY.to_string())),
        ],
        "Seeder",
    )
    .unwrap_or_else(|e| panic!("seeding {asset} failed: {e}"))
}

pub fn request(method: Method, uri: &str, body: &str) -> Request {
    let mut req = Request::new(if body.is_empty() {
        Body::empty()
    } else {
        Body::from(body.to_string())
    });
    *req.method_mut() = method;
    *req.uri_mut() = uri.parse().unwrap();
    req
}

pub fn body_bytes(resp: Response) -> Vec<u8> {
    let mut out = Vec::new();
    resp.into_body().reader().read_to_end(&mut out).unwrap();
    out
}

pub fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp)).unwrap()
}

pub fn content_type(resp: &Response) -> String {
    resp.headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
