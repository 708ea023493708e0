//! Identifier validation and quoting
//!
//! Table and column names are the only names interpolated into query text,
//! so they are checked before they get there.

use crate::core::{QueryError, Result};

const MAX_IDENTIFIER_LEN: usize = 64;

const RESERVED: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TABLE", "FROM", "WHERE",
    "JOIN", "UNION", "ORDER", "GROUP", "INDEX", "PRAGMA",
];

/// Validates a table or column name
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(QueryError::InvalidIdentifier("identifier cannot be empty".to_string()));
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' must start with a letter or underscore",
            name
        )));
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' can only contain letters, numbers, and underscores",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' is too long (max {} characters)",
            name, MAX_IDENTIFIER_LEN
        )));
    }

    if RESERVED.iter().any(|kw| name.eq_ignore_ascii_case(kw)) {
        return Err(QueryError::InvalidIdentifier(format!(
            "'{}' is a reserved keyword",
            name
        )));
    }

    Ok(())
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
