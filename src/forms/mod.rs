//! AcroForm filling, flattening and merging on top of lopdf.

pub mod acroform;
pub mod fill;
pub mod flatten;
pub mod hand_receipt;
pub mod merge;
pub mod text;
pub mod values;

#[cfg(test)]
pub mod test_support;

pub use fill::fill_pdf_form;
pub use hand_receipt::{render_hand_receipts, HandReceiptContext, BLANK_HAND_RECEIPT};
pub use values::FieldValues;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfFormError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no documents to merge")]
    NothingToMerge,
}
