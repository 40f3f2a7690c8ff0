pub mod fields;
pub mod history;
pub mod item;
pub mod receipts;

pub use fields::DomainField;
pub use history::{diff_versions, HistoryEvent};
pub use item::{InventoryItem, VersionSnapshot, STATUS_DEPLOYED, STATUS_READY};
pub use receipts::{group_and_chunk, StagedOutRecord};
