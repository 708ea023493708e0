//! Expression to SQL fragment compilation
//!
//! - `path_resolver.rs` - member/index chains to document paths
//! - `column.rs` - virtual column or JSON extraction for a path
//! - `predicate.rs` - boolean trees to parameterized WHERE text
//! - `projection.rs` - object constructions to ordered field maps

mod column;
mod params;
mod path_resolver;
mod predicate;
mod projection;

pub use column::{ColumnRef, ColumnResolver};
pub use params::Parameters;
pub use path_resolver::{is_document_path, resolve_path};
pub use predicate::{CompiledPredicate, PredicateCompiler};
pub use projection::{CompiledProjection, compile_projection};
