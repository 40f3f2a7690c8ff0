pub mod inventory_xlsx;

pub use inventory_xlsx::export_inventory_xlsx;
