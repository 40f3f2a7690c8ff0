// src/tests/router_tests/receipts_tests.rs

use crate::forms::test_support::extract_all_text;
use crate::router::{handle, respond};
use crate::tests::utils::{body_bytes, body_json, content_type, request, test_state};
use http::Method;
use lopdf::Document;
use serde_json::{json, Value};

fn staged(to_a: usize, to_b: usize) -> Vec<Value> {
    let a = (1..=to_a).map(|i| json!({ "asset": format!("LAP-{i:03}"), "model": "Latitude", "serial": format!("SN{i}"), "to": "Alice" }));
    let b = (1..=to_b).map(|i| json!({ "asset": format!("MON-{i:03}"), "to": "Bob" }));
    a.chain(b).collect()
}

#[test]
fn plan_groups_by_destination_and_chunks() {
    let (state, _db) = test_state("router_plan");
    let body = json!({ "records": staged(7, 1), "chunkSize": 0 }).to_string();

    let resp = handle(request(Method::POST, "/api/hand-receipts/plan", &body), &state).unwrap();
    let groups = body_json(resp);
    let groups = groups.as_array().unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["to"], "Alice");
    assert_eq!(groups[0]["chunks"].as_array().unwrap().len(), 2);
    assert_eq!(groups[0]["chunks"][0].as_array().unwrap().len(), 5);
    assert_eq!(groups[0]["chunks"][1][1]["asset"], "LAP-007");
    assert_eq!(groups[1]["to"], "Bob");
    assert_eq!(groups[1]["chunks"][0][0]["model"], "");
}

#[test]
fn plan_honours_chunk_size() {
    let (state, _db) = test_state("router_plan_size");
    let body = json!({ "records": staged(4, 0), "chunkSize": 2.9 }).to_string();

    let groups = body_json(handle(request(Method::POST, "/api/hand-receipts/plan", &body), &state).unwrap());
    assert_eq!(groups[0]["chunks"].as_array().unwrap().len(), 2);
}

#[test]
fn hand_receipts_merge_one_page_per_chunk() {
    let (state, _db) = test_state("router_receipts");
    let body = json!({
        "records": staged(7, 1),
        "context": {
            "from": "Central Depot",
            "repName": "Ana Lopez",
            "repPhone": "555-0100",
            "date": "2024-03-05"
        }
    })
    .to_string();

    let resp = handle(request(Method::POST, "/api/hand-receipts", &body), &state).unwrap();
    assert_eq!(content_type(&resp), "application/pdf");

    let doc = Document::load_mem(&body_bytes(resp)).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    let text = extract_all_text(&doc);
    assert!(text.contains("Central Depot"));
    assert!(text.contains("Ana Lopez"));
    assert!(text.contains("2024-03-05"));
    assert!(text.contains("Alice"));
    assert!(text.contains("Bob"));
    assert!(text.contains("LAP-001"));
}

#[test]
fn hand_receipts_need_records() {
    let (state, _db) = test_state("router_receipts_empty");
    let body = json!({
        "records": [],
        "context": { "from": "Depot", "repName": "Ana" }
    })
    .to_string();

    let resp = respond(request(Method::POST, "/api/hand-receipts", &body), &state);
    assert_eq!(resp.status(), 400);
    assert!(body_json(resp)["error"].is_string());
}

#[test]
fn hand_receipts_need_a_context() {
    let (state, _db) = test_state("router_receipts_ctx");
    let body = json!({ "records": staged(1, 0) }).to_string();

    let resp = respond(request(Method::POST, "/api/hand-receipts", &body), &state);
    assert_eq!(resp.status(), 400);
}
