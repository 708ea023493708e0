// ============================================================================
// docsql: document queries compiled to SQL over JSON columns
// ============================================================================
//
// Filters and projections over a document table are written as expression
// trees against a lambda parameter and compiled to parameterized SQL. Paths
// served by a generated (virtual) column are read from that column; every
// other path goes through the JSON extraction function.

pub mod config;
pub mod core;
pub mod compiler;
pub mod expression;
pub mod facade;
pub mod schema;
pub mod sql;
pub mod storage;

pub use crate::config::EngineConfig;
pub use crate::core::{ColumnType, DocumentPath, PathSegment, QueryError, Result, Value};
pub use crate::compiler::{
    ColumnRef, CompiledPredicate, CompiledProjection, Parameters, compile_projection, resolve_path,
};
pub use crate::expression::{CompareOp, Expr, LogicalOp, ObjectConstruction};
pub use crate::facade::{DocumentQueryEngine, Provisioner, VirtualColumnSpec};
pub use crate::schema::{
    ColumnInfo, GenerationExpressionParser, JsonExtractParser, SchemaProvider, TableColumns,
    VirtualColumn, VirtualColumnCache,
};
pub use crate::sql::AssembledQuery;
pub use crate::storage::{Row, SqliteStore, StorageExecutor, parse_document};
