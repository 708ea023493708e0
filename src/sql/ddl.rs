//! DDL builders for document tables and virtual columns

use crate::config::EngineConfig;
use crate::core::{ColumnType, DocumentPath, PathSegment, Result};
use super::identifier::{quote_ident, validate_identifier};

/// Name of the virtual column serving `path`: `vc_Address_City`, `vc_Tags_0`
pub fn virtual_column_name(config: &EngineConfig, path: &DocumentPath) -> Result<String> {
    let parts: Vec<String> = path
        .segments()
        .iter()
        .map(|segment| match segment {
            PathSegment::Field(name) => name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect(),
            PathSegment::Index(i) => i.to_string(),
        })
        .collect();

    let name = format!("{}{}", config.virtual_column_prefix, parts.join("_"));
    validate_identifier(&name)?;
    Ok(name)
}

/// Builder for `CREATE TABLE` of a document table (key + JSON body)
pub struct CreateDocumentTableBuilder {
    table_name: String,
    key_column: String,
    document_column: String,
    if_not_exists: bool,
}

impl CreateDocumentTableBuilder {
    pub fn new(config: &EngineConfig, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            key_column: config.key_column.clone(),
            document_column: config.document_column.clone(),
            if_not_exists: true,
        }
    }

    pub fn if_not_exists(mut self, value: bool) -> Self {
        self.if_not_exists = value;
        self
    }

    pub fn build(self) -> Result<String> {
        validate_identifier(&self.table_name)?;
        Ok(format!(
            "CREATE TABLE {}{} ({} TEXT PRIMARY KEY, {} TEXT NOT NULL)",
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_ident(&self.table_name),
            quote_ident(&self.key_column),
            quote_ident(&self.document_column),
        ))
    }
}

/// Builder for `ALTER TABLE .. ADD COLUMN .. GENERATED ALWAYS AS (..) VIRTUAL`
pub struct AddVirtualColumnBuilder {
    table_name: String,
    column_name: String,
    column_type: ColumnType,
    expression: String,
}

impl AddVirtualColumnBuilder {
    /// Column exposing `path` through the configured extraction function
    pub fn for_path(
        config: &EngineConfig,
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        path: &DocumentPath,
        column_type: ColumnType,
    ) -> Self {
        let expression = format!(
            "{}({}, {})",
            config.extract_function,
            quote_ident(&config.document_column),
            path.to_sql_literal()
        );
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            column_type,
            expression,
        }
    }

    pub fn build(self) -> Result<String> {
        validate_identifier(&self.table_name)?;
        validate_identifier(&self.column_name)?;
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {} {} GENERATED ALWAYS AS ({}) VIRTUAL",
            quote_ident(&self.table_name),
            quote_ident(&self.column_name),
            self.column_type,
            self.expression
        ))
    }
}

/// Builder for `CREATE INDEX`
pub struct CreateIndexBuilder {
    table_name: String,
    index_name: Option<String>,
    columns: Vec<String>,
    unique: bool,
}

impl CreateIndexBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: None,
            columns: Vec::new(),
            unique: false,
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Index name used when none is given: `ix_<table>_<columns>`
    pub fn default_name(&self) -> String {
        format!("ix_{}_{}", self.table_name, self.columns.join("_"))
    }

    pub fn build(self) -> Result<String> {
        validate_identifier(&self.table_name)?;
        for column in &self.columns {
            validate_identifier(column)?;
        }
        let index_name = self.index_name.clone().unwrap_or_else(|| self.default_name());
        validate_identifier(&index_name)?;

        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        Ok(format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            quote_ident(&index_name),
            quote_ident(&self.table_name),
            columns.join(", ")
        ))
    }
}
