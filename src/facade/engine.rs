use std::sync::Arc;
use log::debug;
use crate::compiler::{
    ColumnRef, ColumnResolver, CompiledPredicate, CompiledProjection, PredicateCompiler,
    compile_projection,
};
use crate::config::EngineConfig;
use crate::core::{DocumentPath, Result};
use crate::expression::Expr;
use crate::schema::{GenerationExpressionParser, SchemaProvider, VirtualColumnCache};
use crate::sql::{AssembledQuery, QueryAssembler, validate_identifier};

/// Entry point: compiles document queries against a table's virtual columns
///
/// ```ignore
/// let engine = DocumentQueryEngine::new(EngineConfig::default(), store.clone())?;
/// let x = Expr::param();
/// let query = engine
///     .filtered_select("products", &x.member("Category").equals("Electronics"))
///     .await?;
/// let rows = store.fetch(&query).await?;
/// ```
pub struct DocumentQueryEngine {
    config: EngineConfig,
    provider: Arc<dyn SchemaProvider>,
    cache: VirtualColumnCache,
}

impl DocumentQueryEngine {
    pub fn new(config: EngineConfig, provider: Arc<dyn SchemaProvider>) -> Result<Self> {
        config.validate()?;
        let cache = VirtualColumnCache::new(Arc::clone(&provider), &config);
        Ok(Self {
            config,
            provider,
            cache,
        })
    }

    /// Use a different generation expression parser for schema loads
    pub fn with_parser(mut self, parser: Box<dyn GenerationExpressionParser>) -> Self {
        self.cache = self.cache.with_parser(parser);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn SchemaProvider> {
        &self.provider
    }

    pub fn cache(&self) -> &VirtualColumnCache {
        &self.cache
    }

    /// Compile a boolean filter into WHERE text plus parameters
    pub async fn compile_predicate(&self, table: &str, expr: &Expr) -> Result<CompiledPredicate> {
        validate_identifier(table)?;
        let columns = self.cache.get_or_load(table).await?;
        let compiled = PredicateCompiler::new(ColumnResolver::new(&self.config, &columns)).compile(expr)?;
        debug!("compiled filter on '{}': {}", table, compiled.where_text);
        Ok(compiled)
    }

    pub fn compile_projection(&self, expr: &Expr) -> Result<CompiledProjection> {
        compile_projection(expr)
    }

    /// Column reference a path compiles to on `table`
    pub async fn resolve_column(&self, table: &str, path: &DocumentPath) -> Result<ColumnRef> {
        validate_identifier(table)?;
        let columns = self.cache.get_or_load(table).await?;
        Ok(ColumnResolver::new(&self.config, &columns).resolve(path))
    }

    /// `SELECT key, document` of every row matching `filter`
    pub async fn filtered_select(&self, table: &str, filter: &Expr) -> Result<AssembledQuery> {
        validate_identifier(table)?;
        let columns = self.cache.get_or_load(table).await?;
        let resolver = ColumnResolver::new(&self.config, &columns);

        let predicate = PredicateCompiler::new(resolver).compile(filter)?;
        QueryAssembler::new(resolver).generate_filtered_select(table, &predicate)
    }

    /// Projected fields of every row, optionally filtered
    pub async fn projected_select(
        &self,
        table: &str,
        projection: &Expr,
        filter: Option<&Expr>,
    ) -> Result<AssembledQuery> {
        validate_identifier(table)?;
        let projection = compile_projection(projection)?;
        let columns = self.cache.get_or_load(table).await?;
        let resolver = ColumnResolver::new(&self.config, &columns);

        let predicate = filter
            .map(|expr| PredicateCompiler::new(resolver).compile(expr))
            .transpose()?;
        QueryAssembler::new(resolver).generate_projected_select(table, &projection, predicate.as_ref())
    }
}
