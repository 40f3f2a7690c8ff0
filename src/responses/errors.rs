use crate::errors::ServerError;
use crate::templates::components::error::error_page;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

/// Convert a ServerError into a response: JSON for API callers, an HTML page otherwise.
pub fn error_response(err: ServerError, api: bool) -> Response {
    let status = err.status();
    let message = match &err {
        ServerError::NotFound => "Not Found".to_string(),
        ServerError::BadRequest(msg) | ServerError::Unauthorized(msg) => msg.clone(),
        ServerError::Upstream { message, .. } => message.clone(),
        // Internal details stay in the log.
        ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => {
            "Internal Server Error".to_string()
        }
        ServerError::Pdf(e) => e.to_string(),
    };

    if status >= 500 {
        log::error!("{err}");
    } else {
        log::warn!("{err}");
    }

    let built = if api {
        ResponseBuilder::new()
            .status(status)
            .header("Content-Type", mime::APPLICATION_JSON.as_ref())
            .body(Body::from(json!({ "error": message }).to_string()))
    } else {
        ResponseBuilder::new()
            .status(status)
            .header("Content-Type", mime::TEXT_HTML_UTF_8.as_ref())
            .body(Body::from(error_page(status, &message).into_string()))
    };

    built.unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
