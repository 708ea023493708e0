//! Creates document tables and the generated columns that accelerate them

use log::info;
use serde::{Deserialize, Serialize};
use crate::core::{ColumnType, DocumentPath, QueryError, Result};
use crate::schema::VirtualColumn;
use crate::sql::{
    AddVirtualColumnBuilder, AssembledQuery, CreateDocumentTableBuilder, CreateIndexBuilder,
    validate_identifier, virtual_column_name,
};
use crate::storage::StorageExecutor;
use super::engine::DocumentQueryEngine;

/// Requested acceleration of one document path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualColumnSpec {
    pub path: DocumentPath,
    pub column_type: ColumnType,
    pub indexed: bool,
}

impl VirtualColumnSpec {
    pub fn new(path: DocumentPath, column_type: ColumnType) -> Self {
        Self {
            path,
            column_type,
            indexed: false,
        }
    }

    /// Also create an index over the column
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

pub struct Provisioner<'a> {
    engine: &'a DocumentQueryEngine,
    executor: &'a dyn StorageExecutor,
}

impl<'a> Provisioner<'a> {
    pub fn new(engine: &'a DocumentQueryEngine, executor: &'a dyn StorageExecutor) -> Self {
        Self { engine, executor }
    }

    /// `CREATE TABLE IF NOT EXISTS` with the configured key and document columns
    pub async fn ensure_document_table(&self, table: &str) -> Result<()> {
        let ddl = CreateDocumentTableBuilder::new(self.engine.config(), table).build()?;
        self.executor.execute(&AssembledQuery::new(ddl)).await?;
        Ok(())
    }

    /// Add the generated column for `spec.path` unless it already exists, then
    /// make it visible to the compiler. Safe to call repeatedly.
    ///
    /// Column names are derived from paths and are not unique (`$.a_b` and
    /// `$.a.b` both give `vc_a_b`), so an existing column is reused only when
    /// the schema says it serves this exact path.
    pub async fn ensure_virtual_column(
        &self,
        table: &str,
        spec: &VirtualColumnSpec,
    ) -> Result<VirtualColumn> {
        validate_identifier(table)?;
        let config = self.engine.config();
        let cache = self.engine.cache();
        let column_name = virtual_column_name(config, &spec.path)?;

        let mut served = self.served_path(table, &column_name).await?;
        let exists = self.engine.provider().table_has_column(table, &column_name).await?;
        if exists && served.is_none() {
            // snapshot may predate the column
            cache.invalidate(table)?;
            served = self.served_path(table, &column_name).await?;
        }

        match served {
            Some(path) if path != spec.path => {
                return Err(self.name_taken(table, spec, &column_name, &path.to_string()));
            }
            None if exists => {
                return Err(self.name_taken(table, spec, &column_name, "an unrecognized expression"));
            }
            _ => {}
        }

        if !exists {
            let ddl = AddVirtualColumnBuilder::for_path(
                config,
                table,
                column_name.as_str(),
                &spec.path,
                spec.column_type,
            )
            .build()?;
            self.executor.execute(&AssembledQuery::new(ddl)).await?;
            info!("added virtual column {}.{} for {}", table, column_name, spec.path);
        }

        if spec.indexed {
            let ddl = CreateIndexBuilder::new(table).column(column_name.as_str()).build()?;
            self.executor.execute(&AssembledQuery::new(ddl)).await?;
        }

        let column = VirtualColumn::new(spec.path.clone(), column_name, spec.column_type);
        cache.register(table, column.clone())?;
        Ok(column)
    }

    /// Path the named column serves according to the table's snapshot
    async fn served_path(&self, table: &str, column_name: &str) -> Result<Option<DocumentPath>> {
        let snapshot = self.engine.cache().get_or_load(table).await?;
        Ok(snapshot
            .iter()
            .find(|c| c.column_name == column_name)
            .map(|c| c.path.clone()))
    }

    fn name_taken(
        &self,
        table: &str,
        spec: &VirtualColumnSpec,
        column_name: &str,
        serving: &str,
    ) -> QueryError {
        QueryError::VirtualColumnConflict {
            table: table.to_string(),
            path: spec.path.to_string(),
            existing: format!("{} serving {}", column_name, serving),
            requested: format!("{} {}", column_name, spec.column_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use async_trait::async_trait;
    use crate::config::EngineConfig;
    use crate::schema::{ColumnInfo, SchemaProvider};
    use crate::storage::Row;

    /// Records executed DDL and reports columns added by it
    #[derive(Default)]
    struct RecordingStore {
        statements: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn statements(&self) -> Vec<String> {
            self.statements.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SchemaProvider for RecordingStore {
        async fn columns(&self, _table: &str) -> Result<Vec<ColumnInfo>> {
            Ok(vec![ColumnInfo::stored("id", "TEXT"), ColumnInfo::stored("data", "TEXT")])
        }

        async fn table_has_column(&self, _table: &str, column: &str) -> Result<bool> {
            let needle = format!("ADD COLUMN {}", crate::sql::quote_ident(column));
            Ok(self.statements.lock()?.iter().any(|s| s.contains(&needle)))
        }
    }

    #[async_trait]
    impl StorageExecutor for RecordingStore {
        async fn fetch(&self, _query: &AssembledQuery) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute(&self, statement: &AssembledQuery) -> Result<u64> {
            self.statements.lock()?.push(statement.sql.clone());
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_ensure_virtual_column_is_idempotent() {
        let store = Arc::new(RecordingStore::default());
        let engine = DocumentQueryEngine::new(EngineConfig::default(), store.clone()).unwrap();
        let provisioner = Provisioner::new(&engine, store.as_ref());

        let spec = VirtualColumnSpec::new(DocumentPath::parse("$.Category").unwrap(), ColumnType::Text)
            .indexed();
        let column = provisioner.ensure_virtual_column("products", &spec).await.unwrap();
        assert_eq!(column.column_name, "vc_Category");
        provisioner.ensure_virtual_column("products", &spec).await.unwrap();

        let statements = store.statements();
        let added = statements.iter().filter(|s| s.starts_with("ALTER TABLE")).count();
        assert_eq!(added, 1);
        assert!(statements.iter().any(|s| s.starts_with("CREATE INDEX IF NOT EXISTS \"ix_products_vc_Category\"")));

        let resolved = engine
            .resolve_column("products", &spec.path)
            .await
            .unwrap();
        assert!(resolved.is_virtual());
    }

    #[tokio::test]
    async fn test_conflicting_type_is_rejected() {
        let store = Arc::new(RecordingStore::default());
        let engine = DocumentQueryEngine::new(EngineConfig::default(), store.clone()).unwrap();
        let provisioner = Provisioner::new(&engine, store.as_ref());
        let path = DocumentPath::parse("$.Price").unwrap();

        provisioner
            .ensure_virtual_column("products", &VirtualColumnSpec::new(path.clone(), ColumnType::Real))
            .await
            .unwrap();
        let err = provisioner
            .ensure_virtual_column("products", &VirtualColumnSpec::new(path, ColumnType::Text))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::VirtualColumnConflict { .. }));
    }

    #[tokio::test]
    async fn test_colliding_column_name_is_not_reused() {
        let store = Arc::new(RecordingStore::default());
        let engine = DocumentQueryEngine::new(EngineConfig::default(), store.clone()).unwrap();
        let provisioner = Provisioner::new(&engine, store.as_ref());

        let underscored = VirtualColumnSpec::new(DocumentPath::parse("$.a_b").unwrap(), ColumnType::Text);
        let nested = VirtualColumnSpec::new(DocumentPath::parse("$.a.b").unwrap(), ColumnType::Text);
        provisioner.ensure_virtual_column("docs", &underscored).await.unwrap();

        let err = provisioner.ensure_virtual_column("docs", &nested).await.unwrap_err();
        assert!(matches!(err, QueryError::VirtualColumnConflict { .. }));

        let resolved = engine.resolve_column("docs", &nested.path).await.unwrap();
        assert!(!resolved.is_virtual());
        let resolved = engine.resolve_column("docs", &underscored.path).await.unwrap();
        assert_eq!(resolved.to_string(), "\"vc_a_b\"");
    }

    #[tokio::test]
    async fn test_existing_column_of_unknown_origin_is_not_adopted() {
        let store = Arc::new(RecordingStore::default());
        let engine = DocumentQueryEngine::new(EngineConfig::default(), store.clone()).unwrap();
        let provisioner = Provisioner::new(&engine, store.as_ref());
        let spec = VirtualColumnSpec::new(DocumentPath::parse("$.Sku").unwrap(), ColumnType::Text);
        provisioner.ensure_virtual_column("docs", &spec).await.unwrap();

        // the schema reports the column, but not which path it reads
        engine.cache().clear().unwrap();
        let err = provisioner.ensure_virtual_column("docs", &spec).await.unwrap_err();
        assert!(matches!(err, QueryError::VirtualColumnConflict { .. }));
    }

    #[tokio::test]
    async fn test_ensure_document_table() {
        let store = Arc::new(RecordingStore::default());
        let engine = DocumentQueryEngine::new(EngineConfig::default(), store.clone()).unwrap();
        Provisioner::new(&engine, store.as_ref())
            .ensure_document_table("products")
            .await
            .unwrap();
        assert_eq!(
            store.statements(),
            vec!["CREATE TABLE IF NOT EXISTS \"products\" (\"id\" TEXT PRIMARY KEY, \"data\" TEXT NOT NULL)".to_string()]
        );
    }
}
