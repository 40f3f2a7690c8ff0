use crate::auth::Caller;
use crate::domain::receipts::chunk_size_from_raw;
use crate::domain::{diff_versions, group_and_chunk, StagedOutRecord};
use crate::errors::ServerError;
use crate::forms::{fill_pdf_form, render_hand_receipts, FieldValues, HandReceiptContext, BLANK_HAND_RECEIPT};
use crate::inventory::{self, Inventory};
use crate::responses::{error_response, html_response, json_response, pdf_response, ResultResp};
use crate::spreadsheets::export_inventory_xlsx;
use crate::templates::pages::{home_page, item_page, ItemVm};
use astra::{Body, Request, Response, ResponseBuilder};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::time::Instant;
use url::form_urlencoded;

// Request bodies past this size are refused.
const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Everything a request handler needs.
pub struct AppState {
    pub inventory: Box<dyn Inventory>,
}

#[derive(Deserialize)]
struct CheckOutBody {
    to: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanBody {
    records: Vec<StagedOutRecord>,
    #[serde(default)]
    chunk_size: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptContextBody {
    from: String,
    rep_name: String,
    #[serde(default)]
    rep_phone: Option<String>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandReceiptsBody {
    records: Vec<StagedOutRecord>,
    #[serde(default)]
    chunk_size: Option<f64>,
    context: ReceiptContextBody,
}

/// Routes a request and renders any error for the kind of caller it came from.
pub fn respond(req: Request, state: &AppState) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let api = is_api_path(&path);

    let resp = match handle(req, state) {
        Ok(resp) => resp,
        Err(err) => error_response(err, api),
    };

    log::info!(
        "{method} {path} -> {} ({} ms)",
        resp.status().as_u16(),
        started.elapsed().as_millis()
    );
    resp
}

pub fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let caller = Caller::from_request(&req, state.inventory.requires_sign_in())?;
    let inv = state.inventory.as_ref();

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => {
            let q = query_param(&req, "q").unwrap_or_default();
            let items = inv.search(&caller, &q)?;
            html_response(home_page(&caller.display_name, &q, &items))
        }
        ("GET", ["items", id]) => {
            let item = inv.item(&caller, id)?.ok_or(ServerError::NotFound)?;
            let history = diff_versions(&inv.versions(&caller, id)?);
            html_response(item_page(&ItemVm {
                user: &caller.display_name,
                item: &item,
                history: &history,
            }))
        }
        ("POST", ["items", id, "checkout"]) => {
            let form = read_form(&mut req)?;
            let to = form.get("to").map(String::as_str).unwrap_or("");
            inventory::check_out(inv, &caller, id, to)?;
            redirect(&format!("/items/{id}"))
        }
        ("POST", ["items", id, "checkin"]) => {
            inventory::check_in(inv, &caller, id)?;
            redirect(&format!("/items/{id}"))
        }
        ("GET", ["inventory", "export.xlsx"]) => {
            let q = query_param(&req, "q").unwrap_or_default();
            export_inventory_xlsx(&inv.search(&caller, &q)?)
        }

        ("GET", ["api", "items"]) => {
            let q = query_param(&req, "q").unwrap_or_default();
            json_response(200, &inv.search(&caller, &q)?)
        }
        ("GET", ["api", "items", id]) => {
            let item = inv.item(&caller, id)?.ok_or(ServerError::NotFound)?;
            json_response(200, &item)
        }
        ("GET", ["api", "items", id, "history"]) => {
            let versions = inv.versions(&caller, id)?;
            if versions.is_empty() && inv.item(&caller, id)?.is_none() {
                return Err(ServerError::NotFound);
            }
            json_response(200, &diff_versions(&versions))
        }
        ("POST", ["api", "items", id, "checkout"]) => {
            let body: CheckOutBody = read_json(&mut req)?;
            json_response(200, &inventory::check_out(inv, &caller, id, &body.to)?)
        }
        ("POST", ["api", "items", id, "checkin"]) => {
            json_response(200, &inventory::check_in(inv, &caller, id)?)
        }
        ("POST", ["api", "forms", "fill"]) => {
            let template_name = query_param(&req, "template")
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| ServerError::BadRequest("template query parameter is required".into()))?;
            let values: FieldValues = read_json(&mut req)?;
            let template = inv.template(&caller, &template_name)?;
            let filled = fill_pdf_form(&template, &values)?;
            pdf_response(filled, &format!("{template_name}.pdf"))
        }
        ("POST", ["api", "hand-receipts", "plan"]) => {
            let body: PlanBody = read_json(&mut req)?;
            let groups = group_and_chunk(&body.records, chunk_size_from_raw(body.chunk_size));
            json_response(200, &groups)
        }
        ("POST", ["api", "hand-receipts"]) => {
            let body: HandReceiptsBody = read_json(&mut req)?;
            if body.records.is_empty() {
                return Err(ServerError::BadRequest("no staged records".into()));
            }

            let groups = group_and_chunk(&body.records, chunk_size_from_raw(body.chunk_size));
            let ctx = HandReceiptContext {
                from: body.context.from,
                rep_name: body.context.rep_name,
                rep_phone: body.context.rep_phone,
                date: body
                    .context
                    .date
                    .unwrap_or_else(|| chrono::Local::now().date_naive()),
            };
            let template = inv.template(&caller, BLANK_HAND_RECEIPT)?;
            let merged = render_hand_receipts(&template, &groups, &ctx)?;
            pdf_response(merged, "Hand Receipts.pdf")
        }

        _ => Err(ServerError::NotFound),
    }
}

fn query_param(req: &Request, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn read_body(req: &mut Request) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("could not read request body: {e}")))?;

    if buf.len() as u64 > MAX_BODY_BYTES {
        return Err(ServerError::BadRequest("request body too large".into()));
    }
    Ok(buf)
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let body = read_body(req)?;
    serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}

fn read_form(req: &mut Request) -> Result<HashMap<String, String>, ServerError> {
    let body = read_body(req)?;
    Ok(form_urlencoded::parse(&body).into_owned().collect())
}

fn redirect(location: &str) -> ResultResp {
    ResponseBuilder::new()
        .status(303)
        .header("Location", location)
        .body(Body::empty())
        .map_err(|_| ServerError::InternalError)
}
