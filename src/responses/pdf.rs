// responses/pdf.rs
use crate::errors::ServerError;
use crate::responses::{attachment_name, ResultResp};
use astra::{Body, ResponseBuilder};

/// Return a PDF, inline so browsers open it in their viewer.
pub fn pdf_response(buffer: Vec<u8>, filename: &str) -> ResultResp {
    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", mime::APPLICATION_PDF.as_ref())
        .header(
            "Content-Disposition",
            format!("inline; filename=\"{}\"", attachment_name(filename)),
        )
        .body(Body::from(buffer))
        .map_err(|_| ServerError::InternalError)
}
