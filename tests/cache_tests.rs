/// Virtual column cache behavior under concurrent compilation
///
/// Run with: cargo test --test cache_tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use docsql::{
    ColumnInfo, ColumnType, DocumentPath, DocumentQueryEngine, EngineConfig, Expr, QueryError,
    Result, SchemaProvider, VirtualColumn,
};
use futures::future::join_all;

/// Slow provider with one generated column per table
struct SlowSchema {
    delay: Duration,
    loads: AtomicUsize,
}

impl SlowSchema {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            loads: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SchemaProvider for SlowSchema {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if table == "missing" {
            return Err(QueryError::schema_read(table, "no such table"));
        }
        Ok(vec![
            ColumnInfo::stored("id", "TEXT"),
            ColumnInfo::stored("data", "TEXT"),
            ColumnInfo::generated("vc_Category", "TEXT", "json_extract(data, '$.Category')"),
        ])
    }

    async fn table_has_column(&self, _table: &str, column: &str) -> Result<bool> {
        Ok(column == "vc_Category")
    }
}

#[tokio::test]
async fn test_concurrent_compilations_agree() -> anyhow::Result<()> {
    let schema = SlowSchema::new(Duration::from_millis(20));
    let engine = Arc::new(DocumentQueryEngine::new(EngineConfig::default(), schema.clone())?);

    let handles = (0..16).map(|i| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let x = Expr::param();
            engine
                .compile_predicate("products", &x.member("Category").equals(format!("c{}", i)))
                .await
        })
    });

    let results = join_all(handles).await;
    for result in results {
        let compiled = result??;
        assert_eq!(compiled.where_text, "\"vc_Category\" = @p0");
    }

    // racing loads may each read the schema, but one snapshot wins
    let loads = schema.loads.load(Ordering::SeqCst);
    assert!((1..=16).contains(&loads));
    assert_eq!(engine.cache().cached_tables()?, vec!["products".to_string()]);

    engine
        .compile_predicate("products", &Expr::param().member("Price").less_than(3))
        .await?;
    assert_eq!(schema.loads.load(Ordering::SeqCst), loads);

    Ok(())
}

#[tokio::test]
async fn test_register_during_compilation() -> anyhow::Result<()> {
    let schema = SlowSchema::new(Duration::from_millis(1));
    let engine = Arc::new(DocumentQueryEngine::new(EngineConfig::default(), schema)?);
    let x = Expr::param();
    engine.compile_predicate("products", &x.member("Price").greater_than(1)).await?;

    let column = VirtualColumn::new(DocumentPath::parse("$.Price")?, "vc_Price", ColumnType::Real);
    let writer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.cache().register("products", column) })
    };

    let readers = (0..8).map(|_| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let x = Expr::param();
            engine
                .compile_predicate("products", &x.member("Price").greater_than(1))
                .await
        })
    });

    for result in join_all(readers).await {
        // each compilation sees either the old or the new snapshot, never a mix
        let text = result??.where_text;
        assert!(
            text == "json_extract(\"data\", '$.Price') > @p0" || text == "\"vc_Price\" > @p0",
            "{text}"
        );
    }
    writer.await??;

    let compiled = engine
        .compile_predicate("products", &x.member("Price").greater_than(1))
        .await?;
    assert_eq!(compiled.where_text, "\"vc_Price\" > @p0");

    Ok(())
}

#[tokio::test]
async fn test_failed_load_is_not_cached() -> anyhow::Result<()> {
    let schema = SlowSchema::new(Duration::from_millis(1));
    let engine = DocumentQueryEngine::new(EngineConfig::default(), schema.clone())?;
    let filter = Expr::param().member("A").equals(1);

    for _ in 0..2 {
        let err = engine.compile_predicate("missing", &filter).await.unwrap_err();
        assert!(matches!(err, QueryError::SchemaReadFailure { .. }));
    }
    assert_eq!(schema.loads.load(Ordering::SeqCst), 2);
    assert!(engine.cache().cached_tables()?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_slow_schema_read_times_out() -> anyhow::Result<()> {
    let schema = SlowSchema::new(Duration::from_secs(5));
    let config = EngineConfig::new().schema_load_timeout(Duration::from_millis(10));
    let engine = DocumentQueryEngine::new(config, schema)?;

    let err = engine
        .compile_predicate("products", &Expr::param().member("A").equals(1))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("timed out"));

    Ok(())
}
