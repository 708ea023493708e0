//! SQL text generation
//!
//! - `identifier.rs` - identifier validation and quoting
//! - `assembly.rs` - SELECT statements from compiled fragments
//! - `ddl.rs` - document tables, virtual columns and indexes

pub mod assembly;
pub mod ddl;
pub mod identifier;

pub use assembly::{AssembledQuery, QueryAssembler};
pub use ddl::{AddVirtualColumnBuilder, CreateDocumentTableBuilder, CreateIndexBuilder, virtual_column_name};
pub use identifier::{quote_ident, validate_identifier};
