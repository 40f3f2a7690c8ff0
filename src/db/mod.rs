pub mod connection;
pub mod items;

pub use connection::{init_db, Database};
