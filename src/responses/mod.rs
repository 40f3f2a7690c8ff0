pub mod errors;
pub mod html;
pub mod json;
pub mod pdf;
pub mod xlsx;

pub use crate::errors::ResultResp;
pub use errors::error_response;
pub use html::html_response;
pub use json::json_response;
pub use pdf::pdf_response;
pub use xlsx::xlsx_response;

/// Keeps a download name safe inside a quoted `Content-Disposition` value.
pub(crate) fn attachment_name(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim().is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}
