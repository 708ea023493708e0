use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::config::EngineConfig;
use crate::core::{ColumnType, DocumentPath, QueryError, Result};
use super::generation::{GenerationExpressionParser, JsonExtractParser};
use super::provider::{ColumnInfo, SchemaProvider};

/// A generated column exposing one document path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualColumn {
    pub path: DocumentPath,
    pub column_name: String,
    pub column_type: ColumnType,
}

impl VirtualColumn {
    pub fn new(path: DocumentPath, column_name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            path,
            column_name: column_name.into(),
            column_type,
        }
    }
}

/// Immutable snapshot of one table's virtual columns, keyed by path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableColumns {
    columns: HashMap<DocumentPath, VirtualColumn>,
}

impl TableColumns {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &DocumentPath) -> Option<&VirtualColumn> {
        self.columns.get(path)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualColumn> {
        self.columns.values()
    }

    /// New snapshot with `column` added or replaced.
    /// A path never changes type silently.
    pub fn with_column(&self, table: &str, column: VirtualColumn) -> Result<Self> {
        if let Some(existing) = self.columns.get(&column.path) {
            if existing.column_type != column.column_type {
                return Err(QueryError::VirtualColumnConflict {
                    table: table.to_string(),
                    path: column.path.to_string(),
                    existing: format!("{} {}", existing.column_name, existing.column_type),
                    requested: format!("{} {}", column.column_name, column.column_type),
                });
            }
        }

        let mut columns = self.columns.clone();
        columns.insert(column.path.clone(), column);
        Ok(Self { columns })
    }
}

impl TableColumns {
    /// `self` overlaid with every entry of `newer`
    fn overlaid_with(mut self, newer: &TableColumns) -> Self {
        for (path, column) in &newer.columns {
            self.columns.insert(path.clone(), column.clone());
        }
        self
    }
}

impl FromIterator<VirtualColumn> for TableColumns {
    fn from_iter<I: IntoIterator<Item = VirtualColumn>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|c| (c.path.clone(), c)).collect(),
        }
    }
}

/// Per-table virtual column cache
///
/// Readers clone an `Arc` to the current snapshot; writers swap in a new
/// snapshot under a short write lock. The lock is never held across I/O.
pub struct VirtualColumnCache {
    tables: RwLock<HashMap<String, Arc<TableColumns>>>,
    /// Bumped by `invalidate`/`clear` under the write lock
    generation: AtomicU64,
    provider: Arc<dyn SchemaProvider>,
    parser: Box<dyn GenerationExpressionParser>,
    load_timeout: Option<Duration>,
}

impl VirtualColumnCache {
    pub fn new(provider: Arc<dyn SchemaProvider>, config: &EngineConfig) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            provider,
            parser: Box::new(JsonExtractParser::from_config(config)),
            load_timeout: config.schema_load_timeout,
        }
    }

    /// Replace the generation expression parser
    pub fn with_parser(mut self, parser: Box<dyn GenerationExpressionParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Current snapshot without touching the schema
    pub fn snapshot(&self, table: &str) -> Result<Option<Arc<TableColumns>>> {
        let tables = self.tables.read()?;
        Ok(tables.get(table).cloned())
    }

    /// Current snapshot, reading the schema on the first access per table
    pub async fn get_or_load(&self, table: &str) -> Result<Arc<TableColumns>> {
        if let Some(snapshot) = self.snapshot(table)? {
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let loaded = self.load(table).await?;

        let mut tables = self.tables.write()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            // invalidated while loading; serve the result but do not install it
            return Ok(Arc::new(loaded));
        }

        // keep whatever register() or a racing loader installed meanwhile
        let snapshot = match tables.get(table) {
            Some(current) => Arc::new(loaded.overlaid_with(current)),
            None => Arc::new(loaded),
        };
        tables.insert(table.to_string(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Add or replace one column without a schema round-trip
    pub fn register(&self, table: &str, column: VirtualColumn) -> Result<()> {
        let mut tables = self.tables.write()?;
        let current = tables.get(table).cloned().unwrap_or_default();
        let next = current.with_column(table, column)?;
        debug!("registered virtual column on '{}' ({} total)", table, next.len());
        tables.insert(table.to_string(), Arc::new(next));
        Ok(())
    }

    /// Drop one table's snapshot; the next access reloads it
    pub fn invalidate(&self, table: &str) -> Result<()> {
        let mut tables = self.tables.write()?;
        tables.remove(table);
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let mut tables = self.tables.write()?;
        tables.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Tables that currently have a snapshot
    pub fn cached_tables(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn load(&self, table: &str) -> Result<TableColumns> {
        let read = self.provider.columns(table);
        let columns = match self.load_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| QueryError::schema_read(table, format!("timed out after {:?}", limit)))?,
            None => read.await,
        }
        .map_err(|e| match e {
            e @ QueryError::SchemaReadFailure { .. } => e,
            other => QueryError::schema_read(table, other.to_string()),
        })?;

        let snapshot = self.accelerated_columns(table, &columns);
        debug!(
            "loaded schema of '{}': {} columns, {} virtual",
            table,
            columns.len(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    fn accelerated_columns(&self, table: &str, columns: &[ColumnInfo]) -> TableColumns {
        let mut snapshot: HashMap<DocumentPath, VirtualColumn> = HashMap::new();

        for column in columns.iter().filter(|c| c.is_hidden) {
            let path = column
                .generation_expression
                .as_deref()
                .and_then(|text| self.parser.source_path(text));

            let Some(path) = path else {
                warn!(
                    "generated column '{}.{}' does not map to a document path; not used for acceleration",
                    table, column.name
                );
                continue;
            };

            if let Some(first) = snapshot.get(&path) {
                warn!(
                    "'{}.{}' duplicates {} already served by '{}'",
                    table, column.name, path, first.column_name
                );
                continue;
            }

            let column_type = ColumnType::from_declared(&column.declared_type);
            snapshot.insert(path.clone(), VirtualColumn::new(path, column.name.clone(), column_type));
        }

        TableColumns { columns: snapshot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        columns: Vec<ColumnInfo>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SchemaProvider for StaticProvider {
        async fn columns(&self, _table: &str) -> Result<Vec<ColumnInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.columns.clone())
        }

        async fn table_has_column(&self, _table: &str, column: &str) -> Result<bool> {
            Ok(self.columns.iter().any(|c| c.name == column))
        }
    }

    fn path(text: &str) -> DocumentPath {
        DocumentPath::parse(text).unwrap()
    }

    fn cache_over(columns: Vec<ColumnInfo>) -> (Arc<StaticProvider>, VirtualColumnCache) {
        let provider = Arc::new(StaticProvider {
            columns,
            calls: AtomicUsize::new(0),
        });
        let cache = VirtualColumnCache::new(provider.clone(), &EngineConfig::default());
        (provider, cache)
    }

    #[tokio::test]
    async fn test_load_keeps_parseable_generated_columns() {
        let (provider, cache) = cache_over(vec![
            ColumnInfo::stored("id", "TEXT"),
            ColumnInfo::stored("data", "TEXT"),
            ColumnInfo::generated("vc_Category", "TEXT", "json_extract(data, '$.Category')"),
            ColumnInfo::generated("vc_Total", "REAL", "json_extract(data, '$.Price') * 2"),
        ]);

        let snapshot = cache.get_or_load("products").await.unwrap();
        assert_eq!(snapshot.len(), 1);
        let column = snapshot.get(&path("$.Category")).unwrap();
        assert_eq!(column.column_name, "vc_Category");
        assert_eq!(column.column_type, ColumnType::Text);

        cache.get_or_load("products").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_conflicting_type_is_rejected() {
        let (_, cache) = cache_over(vec![]);
        cache
            .register("t", VirtualColumn::new(path("$.Price"), "vc_Price", ColumnType::Real))
            .unwrap();

        let err = cache
            .register("t", VirtualColumn::new(path("$.Price"), "vc_Price_txt", ColumnType::Text))
            .unwrap_err();
        assert!(matches!(err, QueryError::VirtualColumnConflict { .. }));

        // same type replaces
        cache
            .register("t", VirtualColumn::new(path("$.Price"), "vc_Price2", ColumnType::Real))
            .unwrap();
        let snapshot = cache.snapshot("t").unwrap().unwrap();
        assert_eq!(snapshot.get(&path("$.Price")).unwrap().column_name, "vc_Price2");
    }

    #[tokio::test]
    async fn test_snapshots_are_not_mutated_in_place() {
        let (_, cache) = cache_over(vec![]);
        cache
            .register("t", VirtualColumn::new(path("$.A"), "vc_A", ColumnType::Text))
            .unwrap();
        let before = cache.get_or_load("t").await.unwrap();

        cache
            .register("t", VirtualColumn::new(path("$.B"), "vc_B", ColumnType::Text))
            .unwrap();
        let after = cache.get_or_load("t").await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear_force_reload() {
        let (provider, cache) = cache_over(vec![]);
        cache.get_or_load("a").await.unwrap();
        cache.get_or_load("b").await.unwrap();
        assert_eq!(cache.cached_tables().unwrap(), vec!["a".to_string(), "b".to_string()]);

        cache.invalidate("a").unwrap();
        cache.get_or_load("a").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        cache.clear().unwrap();
        assert!(cache.cached_tables().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registered_column_is_served_without_schema_read() {
        let (provider, cache) = cache_over(vec![ColumnInfo::stored("data", "TEXT")]);
        cache
            .register("t", VirtualColumn::new(path("$.Sku"), "vc_Sku", ColumnType::Text))
            .unwrap();

        let snapshot = cache.get_or_load("t").await.unwrap();
        assert_eq!(snapshot.get(&path("$.Sku")).unwrap().column_name, "vc_Sku");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    /// Parks every schema read until `release` is notified
    struct GatedProvider {
        columns: Vec<ColumnInfo>,
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl SchemaProvider for GatedProvider {
        async fn columns(&self, _table: &str) -> Result<Vec<ColumnInfo>> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.columns.clone())
        }

        async fn table_has_column(&self, _table: &str, column: &str) -> Result<bool> {
            Ok(self.columns.iter().any(|c| c.name == column))
        }
    }

    fn gated_cache() -> (Arc<GatedProvider>, Arc<VirtualColumnCache>) {
        let provider = Arc::new(GatedProvider {
            columns: vec![ColumnInfo::generated(
                "vc_Category",
                "TEXT",
                "json_extract(data, '$.Category')",
            )],
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let cache = Arc::new(VirtualColumnCache::new(provider.clone(), &EngineConfig::default()));
        (provider, cache)
    }

    #[tokio::test]
    async fn test_register_during_load_keeps_both_columns() {
        let (provider, cache) = gated_cache();

        let loader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_load("products").await })
        };
        provider.entered.notified().await;
        cache
            .register("products", VirtualColumn::new(path("$.Sku"), "vc_Sku", ColumnType::Text))
            .unwrap();
        provider.release.notify_one();
        loader.await.unwrap().unwrap();

        let snapshot = cache.snapshot("products").unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&path("$.Category")).unwrap().column_name, "vc_Category");
        assert_eq!(snapshot.get(&path("$.Sku")).unwrap().column_name, "vc_Sku");
    }

    #[tokio::test]
    async fn test_load_finishing_after_invalidate_is_not_installed() {
        let (provider, cache) = gated_cache();

        let loader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_load("products").await })
        };
        provider.entered.notified().await;
        cache.invalidate("products").unwrap();
        provider.release.notify_one();

        // the caller still gets what was read
        let served = loader.await.unwrap().unwrap();
        assert_eq!(served.len(), 1);
        assert!(cache.snapshot("products").unwrap().is_none());
        assert!(cache.cached_tables().unwrap().is_empty());
    }
}
