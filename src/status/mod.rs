//! Camera status storage and the update trigger

pub mod store;
pub mod trigger;

pub use store::{reset_items, FileStatusStore, MemoryStatusStore, StatusStore};
pub use trigger::StatusTrigger;
