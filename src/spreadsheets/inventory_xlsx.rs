use crate::domain::{DomainField, InventoryItem};
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use rust_xlsxwriter::{Format, Workbook};

// Image links are left out of the sheet.
const EXPORTED_FIELDS: [DomainField; 6] = [
    DomainField::Asset,
    DomainField::Serial,
    DomainField::Model,
    DomainField::Status,
    DomainField::UserLocation,
    DomainField::Notes,
];

fn xlsx_err(what: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

/// One row per item, header row frozen.
pub fn inventory_workbook(items: &[InventoryItem]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Inventory")
        .map_err(xlsx_err("sheet name"))?;

    let bold = Format::new().set_bold();

    let headers: Vec<&str> = std::iter::once("ID")
        .chain(EXPORTED_FIELDS.iter().map(|f| f.label()))
        .chain(["Modified", "Modified By"])
        .collect();

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx_err(header))?;
    }

    for (i, item) in items.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet
            .write_string(r, 0, &item.id)
            .map_err(xlsx_err("id"))?;

        for (offset, field) in EXPORTED_FIELDS.iter().enumerate() {
            worksheet
                .write_string(r, (offset + 1) as u16, item.get(*field).unwrap_or(""))
                .map_err(xlsx_err(field.label()))?;
        }

        let col = (EXPORTED_FIELDS.len() + 1) as u16;
        worksheet
            .write_string(r, col, item.modified.as_deref().unwrap_or(""))
            .map_err(xlsx_err("modified"))?;
        worksheet
            .write_string(r, col + 1, item.modified_by.as_deref().unwrap_or(""))
            .map_err(xlsx_err("modified by"))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(xlsx_err("freeze panes"))?;
    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))
}

pub fn export_inventory_xlsx(items: &[InventoryItem]) -> ResultResp {
    let buffer = inventory_workbook(items)?;
    let stamp = chrono::Local::now().format("%Y-%m-%d");
    xlsx_response(buffer, &format!("inventory_{stamp}.xlsx"))
}
