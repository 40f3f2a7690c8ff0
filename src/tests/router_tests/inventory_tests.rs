// src/tests/router_tests/inventory_tests.rs

use crate::config::GraphSettings;
use crate::inventory::graph::GraphInventory;
use crate::router::{handle, respond, AppState};
use crate::tests::utils::{body_bytes, body_json, content_type, request, seed_item, test_state};
use http::Method;
use serde_json::json;

#[test]
fn unknown_routes_are_not_found() {
    let (state, _db) = test_state("router_404");

    let err = handle(request(Method::GET, "/nope", ""), &state).unwrap_err();
    assert!(matches!(err, crate::errors::ServerError::NotFound));

    let resp = respond(request(Method::DELETE, "/api/items", ""), &state);
    assert_eq!(resp.status(), 404);
    assert_eq!(body_json(resp), json!({ "error": "Not Found" }));
}

#[test]
fn search_page_lists_matching_items() {
    let (state, db) = test_state("router_search");
    seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");
    seed_item(&db, "MON-002", "SN-BBB", "Dell P2422H");

    let resp = handle(request(Method::GET, "/?q=lap", ""), &state).unwrap();
    assert!(content_type(&resp).starts_with("text/html"));
    let html = String::from_utf8(body_bytes(resp)).unwrap();
    assert!(html.contains("LAP-001"));
    assert!(!html.contains("MON-002"));
}

#[test]
fn api_search_returns_json_items() {
    let (state, db) = test_state("router_api_search");
    seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");
    seed_item(&db, "MON-002", "SN-BBB", "Dell P2422H");

    let resp = handle(request(Method::GET, "/api/items?q=sn-bbb", ""), &state).unwrap();
    let items = body_json(resp);
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["asset"], "MON-002");
    assert_eq!(items[0]["status"], "Ready to Deploy");
}

#[test]
fn check_out_shows_up_in_history() {
    let (state, db) = test_state("router_checkout");
    let item = seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");

    let resp = handle(
        request(
            Method::POST,
            &format!("/api/items/{}/checkout", item.id),
            r#"{"to":"Bob Smith"}"#,
        ),
        &state,
    )
    .unwrap();
    let updated = body_json(resp);
    assert_eq!(updated["status"], "Deployed");
    assert_eq!(updated["userLocation"], "Bob Smith");
    assert_eq!(updated["modifiedBy"], "Local User");

    let resp = handle(
        request(Method::GET, &format!("/api/items/{}/history", item.id), ""),
        &state,
    )
    .unwrap();
    let events = body_json(resp);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.contains(&json!({
        "timestamp": updated["modified"],
        "actor": "Local User",
        "field": "status",
        "kind": "changed",
        "from": "Ready to Deploy",
        "to": "Deployed"
    })));
    assert!(events.contains(&json!({
        "timestamp": updated["modified"],
        "actor": "Local User",
        "field": "userLocation",
        "kind": "added",
        "to": "Bob Smith"
    })));
}

#[test]
fn check_in_clears_location() {
    let (state, db) = test_state("router_checkin");
    let item = seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");
    let checkout = format!("/api/items/{}/checkout", item.id);
    let checkin = format!("/api/items/{}/checkin", item.id);

    handle(request(Method::POST, &checkout, r#"{"to":"Bob"}"#), &state).unwrap();
    let back = body_json(handle(request(Method::POST, &checkin, ""), &state).unwrap());
    assert_eq!(back["status"], "Ready to Deploy");
    assert_eq!(back["userLocation"], serde_json::Value::Null);
}

#[test]
fn check_out_errors_are_json() {
    let (state, db) = test_state("router_checkout_err");
    let item = seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");

    let resp = respond(
        request(
            Method::POST,
            &format!("/api/items/{}/checkout", item.id),
            r#"{"to":"   "}"#,
        ),
        &state,
    );
    assert_eq!(resp.status(), 400);
    assert!(content_type(&resp).starts_with("application/json"));
    assert!(body_json(resp)["error"].as_str().unwrap().contains("recipient"));

    let resp = respond(request(Method::POST, "/api/items/999/checkout", r#"{"to":"Bob"}"#), &state);
    assert_eq!(resp.status(), 404);

    let resp = respond(request(Method::POST, "/api/items/1/checkout", "{not json"), &state);
    assert_eq!(resp.status(), 400);
}

#[test]
fn item_page_form_checks_out_and_redirects() {
    let (state, db) = test_state("router_item_form");
    let item = seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");

    let resp = handle(
        request(
            Method::POST,
            &format!("/items/{}/checkout", item.id),
            "to=Bob+Smith",
        ),
        &state,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(
        resp.headers().get("Location").unwrap().to_str().unwrap(),
        format!("/items/{}", item.id)
    );

    let html = String::from_utf8(body_bytes(
        handle(request(Method::GET, &format!("/items/{}", item.id), ""), &state).unwrap(),
    ))
    .unwrap();
    assert!(html.contains("Bob Smith"));
    assert!(html.contains("Deployed"));
    assert!(html.contains("/checkin"));
}

#[test]
fn missing_item_page_is_html_404() {
    let (state, _db) = test_state("router_item_404");
    let resp = respond(request(Method::GET, "/items/404", ""), &state);
    assert_eq!(resp.status(), 404);
    assert!(content_type(&resp).starts_with("text/html"));
}

#[test]
fn export_returns_xlsx() {
    let (state, db) = test_state("router_export");
    seed_item(&db, "LAP-001", "SN-AAA", "Latitude 7440");

    let resp = handle(request(Method::GET, "/inventory/export.xlsx", ""), &state).unwrap();
    assert_eq!(
        content_type(&resp),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(body_bytes(resp).starts_with(b"PK"));
}

#[test]
fn live_mode_requires_a_bearer_token() {
    let inventory = GraphInventory::new(&GraphSettings {
        tenant_id: "t".into(),
        client_id: "c".into(),
        client_secret: "s".into(),
        site_id: "site".into(),
        list_id: "list".into(),
        templates_folder: "Templates".into(),
    })
    .unwrap();
    let state = AppState {
        inventory: Box::new(inventory),
    };

    let resp = respond(request(Method::GET, "/api/items", ""), &state);
    assert_eq!(resp.status(), 401);
    assert!(body_json(resp)["error"].is_string());
}
