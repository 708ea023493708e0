//! Final SELECT text from compiled fragments
//!
//! Purely textual. Interpolated pieces are the validated table name, the
//! configured column names, virtual column names and compiler-rendered path
//! literals; values only ever travel in the parameter bag.

use crate::compiler::{ColumnResolver, CompiledPredicate, CompiledProjection, Parameters};
use crate::core::{QueryError, Result, Value};
use super::identifier::{quote_ident, validate_identifier};

/// Query text plus the parameters its placeholders refer to
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledQuery {
    pub sql: String,
    pub parameters: Parameters,
}

impl AssembledQuery {
    /// Statement without parameters
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Parameters::new(),
        }
    }

    /// Add a named parameter for a hand-written statement
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters = self.parameters.bind(name, value);
        self
    }
}

pub struct QueryAssembler<'a> {
    resolver: ColumnResolver<'a>,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(resolver: ColumnResolver<'a>) -> Self {
        Self { resolver }
    }

    /// `SELECT "id", "data" FROM "table" WHERE ...`
    pub fn generate_filtered_select(
        &self,
        table: &str,
        predicate: &CompiledPredicate,
    ) -> Result<AssembledQuery> {
        validate_identifier(table)?;
        let config = self.resolver.config();

        let sql = format!(
            "SELECT {}, {} FROM {} WHERE {}",
            quote_ident(&config.key_column),
            quote_ident(&config.document_column),
            quote_ident(table),
            predicate.where_text
        );

        Ok(AssembledQuery {
            sql,
            parameters: predicate.parameters.clone(),
        })
    }

    /// `SELECT <col> AS "Field", ... FROM "table" [WHERE ...]`
    pub fn generate_projected_select(
        &self,
        table: &str,
        projection: &CompiledProjection,
        predicate: Option<&CompiledPredicate>,
    ) -> Result<AssembledQuery> {
        validate_identifier(table)?;
        if projection.is_empty() {
            return Err(QueryError::UnsupportedExpression(
                "projection without fields".to_string(),
            ));
        }

        let columns: Vec<String> = projection
            .iter()
            .map(|(field, path)| format!("{} AS {}", self.resolver.resolve(path), quote_ident(field)))
            .collect();

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), quote_ident(table));
        let parameters = match predicate {
            Some(predicate) => {
                sql.push_str(" WHERE ");
                sql.push_str(&predicate.where_text);
                predicate.parameters.clone()
            }
            None => Parameters::new(),
        };

        Ok(AssembledQuery { sql, parameters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{PredicateCompiler, compile_projection};
    use crate::config::EngineConfig;
    use crate::core::{ColumnType, DocumentPath};
    use crate::expression::{Expr, ObjectConstruction};
    use crate::schema::{TableColumns, VirtualColumn};

    fn columns() -> TableColumns {
        vec![VirtualColumn::new(
            DocumentPath::parse("$.Category").unwrap(),
            "vc_Category",
            ColumnType::Text,
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_filtered_select() {
        let config = EngineConfig::default();
        let columns = columns();
        let resolver = ColumnResolver::new(&config, &columns);

        let x = Expr::param();
        let predicate = PredicateCompiler::new(resolver)
            .compile(&x.member("Category").equals("A"))
            .unwrap();
        let query = QueryAssembler::new(resolver)
            .generate_filtered_select("products", &predicate)
            .unwrap();

        assert_eq!(
            query.sql,
            "SELECT \"id\", \"data\" FROM \"products\" WHERE \"vc_Category\" = @p0"
        );
        assert_eq!(query.parameters.get("p0"), Some(&Value::from("A")));
    }

    #[test]
    fn test_projected_select_with_and_without_filter() {
        let config = EngineConfig::default();
        let columns = columns();
        let resolver = ColumnResolver::new(&config, &columns);
        let x = Expr::param();

        let projection = compile_projection(
            &ObjectConstruction::anonymous()
                .bind("Category", x.member("Category"))
                .bind("Price", x.member("Price"))
                .build(),
        )
        .unwrap();
        let assembler = QueryAssembler::new(resolver);

        let query = assembler
            .generate_projected_select("products", &projection, None)
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT \"vc_Category\" AS \"Category\", json_extract(\"data\", '$.Price') AS \"Price\" FROM \"products\""
        );
        assert!(query.parameters.is_empty());

        let predicate = PredicateCompiler::new(resolver)
            .compile(&x.member("Price").less_than(10))
            .unwrap();
        let query = assembler
            .generate_projected_select("products", &projection, Some(&predicate))
            .unwrap();
        assert!(query.sql.ends_with("FROM \"products\" WHERE json_extract(\"data\", '$.Price') < @p0"));
        assert_eq!(query.parameters.len(), 1);
    }

    #[test]
    fn test_table_name_is_validated() {
        let config = EngineConfig::default();
        let columns = TableColumns::empty();
        let resolver = ColumnResolver::new(&config, &columns);
        let predicate = PredicateCompiler::new(resolver)
            .compile(&Expr::param().member("A").equals(1))
            .unwrap();

        let err = QueryAssembler::new(resolver)
            .generate_filtered_select("products; DROP TABLE users", &predicate)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier(_)));
    }
}
