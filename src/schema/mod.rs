//! Schema-derived acceleration metadata
//!
//! - `provider.rs` - the schema metadata collaborator
//! - `generation.rs` - recovering source paths from generation expressions
//! - `cache.rs` - per-table snapshots of virtual columns

mod cache;
mod generation;
mod provider;

pub use cache::{TableColumns, VirtualColumn, VirtualColumnCache};
pub use generation::{GenerationExpressionParser, JsonExtractParser};
pub use provider::{ColumnInfo, SchemaProvider};
