use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::Result;

/// Column metadata as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,

    /// Declared type text, e.g. `TEXT` or `REAL`
    pub declared_type: String,

    /// Generated (computed) column, not part of the stored row
    pub is_hidden: bool,

    /// Text of the generation expression for hidden columns
    pub generation_expression: Option<String>,
}

impl ColumnInfo {
    pub fn stored(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            is_hidden: false,
            generation_expression: None,
        }
    }

    pub fn generated(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            is_hidden: true,
            generation_expression: Some(expression.into()),
        }
    }
}

/// Schema metadata collaborator
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// All columns of `table`, generated ones included
    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    async fn table_has_column(&self, table: &str, column: &str) -> Result<bool>;
}
