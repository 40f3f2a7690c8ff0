// src/tests/router_tests/forms_tests.rs

use crate::forms::test_support::extract_all_text;
use crate::router::{handle, respond};
use crate::tests::utils::{body_bytes, body_json, content_type, request, test_state};
use http::Method;
use lopdf::Document;

const FILL_URI: &str = "/api/forms/fill?template=Blank%20Hand%20Receipt";

#[test]
fn fill_returns_a_flattened_pdf() {
    let (state, _db) = test_state("router_fill");

    let resp = handle(
        request(
            Method::POST,
            FILL_URI,
            r#"{"FROM":"Central Depot","ASSET 1":"LAP-001","QTY 1":1,"NOT A FIELD":"ignored"}"#,
        ),
        &state,
    )
    .unwrap();
    assert_eq!(content_type(&resp), "application/pdf");

    let bytes = body_bytes(resp);
    assert!(bytes.starts_with(b"%PDF"));

    let doc = Document::load_mem(&bytes).unwrap();
    let text = extract_all_text(&doc);
    assert!(text.contains("Central Depot"));
    assert!(text.contains("LAP-001"));
    assert!(!text.contains("ignored"));
    assert!(!String::from_utf8_lossy(&bytes).contains("/AcroForm"));
}

#[test]
fn fill_requires_a_template_name() {
    let (state, _db) = test_state("router_fill_name");

    let resp = respond(request(Method::POST, "/api/forms/fill", "{}"), &state);
    assert_eq!(resp.status(), 400);
    assert!(body_json(resp)["error"].as_str().unwrap().contains("template"));
}

#[test]
fn fill_with_unknown_template_is_not_found() {
    let (state, _db) = test_state("router_fill_missing");

    let resp = respond(
        request(Method::POST, "/api/forms/fill?template=Nope", "{}"),
        &state,
    );
    assert_eq!(resp.status(), 404);
    assert!(content_type(&resp).starts_with("application/json"));
}

#[test]
fn fill_rejects_non_object_bodies() {
    let (state, _db) = test_state("router_fill_body");

    let resp = respond(request(Method::POST, FILL_URI, r#"["FROM"]"#), &state);
    assert_eq!(resp.status(), 400);
}
