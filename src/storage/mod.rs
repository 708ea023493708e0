pub mod executor;
pub mod sqlite;

pub use executor::{Row, StorageExecutor, parse_document};
pub use sqlite::SqliteStore;
