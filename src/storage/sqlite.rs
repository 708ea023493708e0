//! SQLite collaborator backed by sqlx
//!
//! Serves schema metadata (`PRAGMA table_xinfo` plus the stored
//! `CREATE TABLE` text) and executes assembled queries.

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use crate::compiler::Parameters;
use crate::core::{QueryError, Result, Value};
use crate::schema::{ColumnInfo, SchemaProvider};
use crate::sql::{AssembledQuery, quote_ident, validate_identifier};
use super::executor::{Row, StorageExecutor};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. One connection that never expires,
    /// since every new connection would open an empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SchemaProvider for SqliteStore {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        validate_identifier(table)?;

        let rows = sqlx::query(&format!("PRAGMA table_xinfo({})", quote_ident(table)))
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Err(QueryError::schema_read(table, "no such table"));
        }

        let create_sql: Option<String> =
            sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("name")?;
            let declared_type: String = row.try_get("type")?;
            // 2 = generated VIRTUAL, 3 = generated STORED
            let hidden: i64 = row.try_get("hidden")?;
            let is_hidden = hidden != 0;

            let generation_expression = match (&create_sql, is_hidden) {
                (Some(sql), true) => generation_expression(sql, &name),
                _ => None,
            };

            columns.push(ColumnInfo {
                name,
                declared_type,
                is_hidden,
                generation_expression,
            });
        }

        debug!("read {} columns of '{}'", columns.len(), table);
        Ok(columns)
    }

    async fn table_has_column(&self, table: &str, column: &str) -> Result<bool> {
        validate_identifier(table)?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_xinfo(?1) WHERE name = ?2")
                .bind(table)
                .bind(column)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl StorageExecutor for SqliteStore {
    async fn fetch(&self, query: &AssembledQuery) -> Result<Vec<Row>> {
        let sql = number_placeholders(&query.sql, &query.parameters)?;
        let rows = bind_parameters(sqlx::query(&sql), &query.parameters)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &AssembledQuery) -> Result<u64> {
        let sql = number_placeholders(&statement.sql, &statement.parameters)?;
        let result = bind_parameters(sqlx::query(&sql), &statement.parameters)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Rewrite `@name` placeholders to `?N`, N being the 1-based position of
/// `name` in the bag. Quoted literals and identifiers are copied untouched.
fn number_placeholders(sql: &str, parameters: &Parameters) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut closing_quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(close) = closing_quote {
            out.push(c);
            if c == close {
                closing_quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                closing_quote = Some(c);
                out.push(c);
            }
            '[' => {
                closing_quote = Some(']');
                out.push(c);
            }
            '@' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !(n.is_ascii_alphanumeric() || n == '_') {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                let position = parameters.position(&name).ok_or_else(|| {
                    QueryError::Storage(format!("no value bound for parameter @{}", name))
                })?;
                out.push_str(&format!("?{}", position + 1));
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

fn bind_parameters<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    parameters: &'q Parameters,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in parameters.values() {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Integer(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Boolean(b) => query.bind(*b),
        };
    }
    query
}

/// Decode by the runtime storage class; expression columns have no declared type
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            JsonValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => JsonValue::from(row.try_get::<i64, _>(i)?),
                "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(i)?)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(i)?;
                    JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => JsonValue::String(row.try_get::<String, _>(i)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }

    Ok(out)
}

/// Generation expression of `column` inside a `CREATE TABLE` statement
fn generation_expression(create_sql: &str, column: &str) -> Option<String> {
    let name = regex::escape(column);
    let pattern = format!(
        r#"(?is)(?:^|[(,])\s*(?:\[{name}\]|"{name}"|`{name}`|{name})\s+[^,]*?(?:GENERATED\s+ALWAYS\s+)?AS\s*\("#
    );
    let start = Regex::new(&pattern).ok()?.find(create_sql)?.end();

    let mut depth = 1usize;
    let mut in_string = false;
    for (offset, c) in create_sql[start..].char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(create_sql[start..start + offset].trim().to_string());
                }
            }
            _ => {}
        }
    }
    None
}
