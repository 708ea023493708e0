//! Recovering a virtual column's source path from its generation expression

use lazy_static::lazy_static;
use regex::Regex;
use crate::config::EngineConfig;
use crate::core::DocumentPath;

lazy_static! {
    /// `func(column, 'path')` with the column bare or quoted in any of
    /// SQLite's identifier styles
    static ref EXTRACT_CALL: Regex = Regex::new(
        r#"(?is)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*(?:\[([^\]]+)\]|"([^"]+)"|`([^`]+)`|([A-Za-z_][A-Za-z0-9_]*))\s*,\s*'((?:[^']|'')*)'\s*\)\s*$"#
    )
    .unwrap();
}

/// Maps generation expression text to the document path it exposes
pub trait GenerationExpressionParser: Send + Sync {
    /// `None` when the expression is not a plain path extraction
    fn source_path(&self, expression: &str) -> Option<DocumentPath>;
}

/// Recognizes `json_extract(data, '$.path')`
#[derive(Debug, Clone)]
pub struct JsonExtractParser {
    function: String,
    document_column: String,
}

impl JsonExtractParser {
    pub fn new(function: impl Into<String>, document_column: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            document_column: document_column.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.extract_function.clone(), config.document_column.clone())
    }
}

impl GenerationExpressionParser for JsonExtractParser {
    fn source_path(&self, expression: &str) -> Option<DocumentPath> {
        let caps = EXTRACT_CALL.captures(strip_outer_parens(expression))?;

        if !caps[1].eq_ignore_ascii_case(&self.function) {
            return None;
        }

        let column = (2..=5).find_map(|i| caps.get(i))?.as_str();
        if !column.eq_ignore_ascii_case(&self.document_column) {
            return None;
        }

        let literal = caps[6].replace("''", "'");
        DocumentPath::parse(&literal).ok()
    }
}

/// `((expr))` -> `expr`, only while the parens enclose the whole text
fn strip_outer_parens(mut text: &str) -> &str {
    loop {
        let trimmed = text.trim();
        if !(trimmed.starts_with('(') && trimmed.ends_with(')')) {
            return trimmed;
        }

        let inner = &trimmed[1..trimmed.len() - 1];
        let mut depth = 0i32;
        let mut in_string = false;
        for c in inner.chars() {
            match c {
                '\'' => in_string = !in_string,
                '(' if !in_string => depth += 1,
                ')' if !in_string => {
                    depth -= 1;
                    if depth < 0 {
                        return trimmed;
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return trimmed;
        }
        text = inner;
    }
}
