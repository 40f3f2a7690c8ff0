// src/forms/hand_receipt.rs

use crate::domain::receipts::{HandReceiptLine, ReceiptGroup};
use crate::forms::fill::fill_pdf_form;
use crate::forms::merge::merge_documents;
use crate::forms::values::FieldValues;
use crate::forms::PdfFormError;
use chrono::NaiveDate;

/// Template name of the generic hand receipt.
pub const BLANK_HAND_RECEIPT: &str = "Blank Hand Receipt";

/// Asset rows on one receipt page.
pub const SLOT_COUNT: usize = 5;

pub const FIELD_FROM: &str = "FROM";
pub const FIELD_TO: &str = "TO";
pub const FIELD_DATE: &str = "DATE";
pub const FIELD_REP_NAME: &str = "REP NAME";
pub const FIELD_REP_PHONE: &str = "REP PHONE";

/// Fields left for pen and ink; never written.
pub const EXPLICITLY_BLANK: [&str; 2] = ["SIGNATURE", "REMARKS"];

/// Everything on a receipt that is not an asset row.
#[derive(Debug, Clone, PartialEq)]
pub struct HandReceiptContext {
    pub from: String,
    pub rep_name: String,
    pub rep_phone: Option<String>,
    pub date: NaiveDate,
}

/// The five per-slot field names for slot `n` (1-based).
pub fn slot_fields(n: usize) -> [String; 5] {
    [
        format!("ASSET {n}"),
        format!("MODEL {n}"),
        format!("SERIAL/ASSET NO {n}"),
        format!("QTY {n}"),
        format!("UNIT {n}"),
    ]
}

/// Maps one batch of lines onto the Blank Hand Receipt field set.
///
/// Slots without a line are left out of the map entirely, as are the
/// explicitly blank fields. Lines past [`SLOT_COUNT`] are ignored.
pub fn blank_hand_receipt_fields(
    lines: &[HandReceiptLine],
    ctx: &HandReceiptContext,
    to: &str,
) -> FieldValues {
    let mut values = FieldValues::new();

    values.set(FIELD_FROM, ctx.from.as_str());
    values.set(FIELD_TO, to);
    values.set(FIELD_DATE, ctx.date);
    values.set(FIELD_REP_NAME, ctx.rep_name.as_str());
    if let Some(phone) = ctx.rep_phone.as_deref().filter(|p| !p.trim().is_empty()) {
        values.set(FIELD_REP_PHONE, phone);
    }

    if lines.len() > SLOT_COUNT {
        log::warn!(
            "hand receipt for '{to}' has {} lines; only {SLOT_COUNT} fit",
            lines.len()
        );
    }

    for (i, line) in lines.iter().take(SLOT_COUNT).enumerate() {
        let [asset, model, serial, qty, unit] = slot_fields(i + 1);
        values.set(asset, line.asset.as_str());
        values.set(model, line.model.as_str());
        values.set(serial, line.serial.as_str());
        values.set(qty, 1i64);
        values.set(unit, "EA");
    }

    values
}

/// Fills one receipt per chunk and merges them in group, then chunk, order.
pub fn render_hand_receipts(
    template: &[u8],
    groups: &[ReceiptGroup],
    ctx: &HandReceiptContext,
) -> Result<Vec<u8>, PdfFormError> {
    let mut documents = Vec::new();

    for group in groups {
        for chunk in &group.chunks {
            let values = blank_hand_receipt_fields(chunk, ctx, &group.to);
            documents.push(fill_pdf_form(template, &values)?);
        }
    }

    log::info!(
        "rendered {} hand receipt(s) for {} destination(s)",
        documents.len(),
        groups.len()
    );

    merge_documents(&documents)
}
