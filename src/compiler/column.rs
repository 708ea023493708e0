use std::fmt;
use crate::config::EngineConfig;
use crate::core::DocumentPath;
use crate::schema::TableColumns;
use crate::sql::identifier::quote_ident;

/// Where a document path's value is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Generated column serving exactly this path
    Virtual { column: String },

    /// Extraction from the raw document column
    Extract {
        function: String,
        document_column: String,
        path: DocumentPath,
    },
}

impl ColumnRef {
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual { .. })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual { column } => write!(f, "{}", quote_ident(column)),
            Self::Extract {
                function,
                document_column,
                path,
            } => write!(
                f,
                "{}({}, {})",
                function,
                quote_ident(document_column),
                path.to_sql_literal()
            ),
        }
    }
}

/// Resolves paths against one table's snapshot
///
/// Only an exact path match is substituted; the column's declared type does
/// not take part in the decision.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    config: &'a EngineConfig,
    columns: &'a TableColumns,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(config: &'a EngineConfig, columns: &'a TableColumns) -> Self {
        Self { config, columns }
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub fn resolve(&self, path: &DocumentPath) -> ColumnRef {
        match self.columns.get(path) {
            Some(column) => ColumnRef::Virtual {
                column: column.column_name.clone(),
            },
            None => ColumnRef::Extract {
                function: self.config.extract_function.clone(),
                document_column: self.config.document_column.clone(),
                path: path.clone(),
            },
        }
    }
}
