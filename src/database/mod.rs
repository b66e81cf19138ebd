pub mod db;
pub mod medium;
pub mod store;

pub use db::SqliteMedium;
pub use medium::{KeyValueMedium, MemoryMedium};
pub use store::CardStateStore;
