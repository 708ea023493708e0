use async_trait::async_trait;
use serde_json::Value as JsonValue;
use crate::core::{QueryError, Result};
use crate::sql::AssembledQuery;

/// One result row, keyed by column name
pub type Row = serde_json::Map<String, JsonValue>;

/// Storage execution collaborator
#[async_trait]
pub trait StorageExecutor: Send + Sync {
    /// Run a query and return its rows
    async fn fetch(&self, query: &AssembledQuery) -> Result<Vec<Row>>;

    /// Run a statement (DDL or DML); returns the number of affected rows
    async fn execute(&self, statement: &AssembledQuery) -> Result<u64>;
}

/// Parse the JSON document stored in `column` of a row
pub fn parse_document(row: &Row, column: &str) -> Result<JsonValue> {
    match row.get(column) {
        Some(JsonValue::String(text)) => serde_json::from_str(text)
            .map_err(|e| QueryError::Storage(format!("column '{}' is not valid JSON: {}", column, e))),
        Some(other) => Ok(other.clone()),
        None => Err(QueryError::Storage(format!("row has no column '{}'", column))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_document() {
        let mut row = Row::new();
        row.insert("data".into(), json!("{\"Name\":\"Widget\"}"));
        assert_eq!(parse_document(&row, "data").unwrap(), json!({ "Name": "Widget" }));
        assert!(parse_document(&row, "body").is_err());

        row.insert("data".into(), json!("{not json"));
        assert!(parse_document(&row, "data").is_err());
    }
}
