pub mod home;
pub mod item;

pub use home::home_page;
pub use item::{item_page, ItemVm};
