pub mod card;
pub mod error;

pub use card::{card, status_badge};
