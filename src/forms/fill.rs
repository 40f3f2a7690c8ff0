// src/forms/fill.rs

use crate::forms::acroform::PdfForm;
use crate::forms::values::{FieldValues, FormValue};
use crate::forms::PdfFormError;

/// Fills an AcroForm template and returns the flattened document.
///
/// Booleans go to checkboxes and everything else to text fields. A name that
/// does not exist, or exists with the other field type, is skipped. The only
/// error is a template that does not parse (or cannot be rewritten).
pub fn fill_pdf_form(template: &[u8], values: &FieldValues) -> Result<Vec<u8>, PdfFormError> {
    let mut form = PdfForm::load(template)?;
    let mut applied = 0usize;

    for (name, value) in values.iter() {
        match value {
            FormValue::Bool(checked) => match form.check_box(name) {
                Some(field) => {
                    form.set_checked(&field, *checked)?;
                    applied += 1;
                }
                None => log::debug!("no checkbox named '{name}', skipping"),
            },
            other => match form.text_field(name) {
                Some(field) => {
                    form.set_text(field, &other.to_text())?;
                    applied += 1;
                }
                None => log::debug!("no text field named '{name}', skipping"),
            },
        }
    }

    log::debug!("filled {applied} of {} form values", values.len());

    form.flatten()?;
    form.save()
}
