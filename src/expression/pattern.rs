use crate::core::{QueryError, Result};
use regex::RegexBuilder;

/// Escape character paired with every generated LIKE pattern
pub const LIKE_ESCAPE: char = '\\';

/// String predicates that translate to LIKE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringMatch {
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "Contains" => Some(Self::Contains),
            "StartsWith" => Some(Self::StartsWith),
            "EndsWith" => Some(Self::EndsWith),
            _ => None,
        }
    }

    /// Escape the needle and wrap it in the wildcards this predicate needs.
    pub fn pattern(self, needle: &str) -> String {
        let escaped = escape_like(needle);
        match self {
            Self::Contains => format!("%{}%", escaped),
            Self::StartsWith => format!("{}%", escaped),
            Self::EndsWith => format!("%{}", escaped),
        }
    }
}

/// Escape LIKE metacharacters so the caller's text matches literally
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Convert a LIKE pattern (with `\` escapes) to an anchored regex
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            LIKE_ESCAPE => {
                if let Some(next) = chars.next() {
                    regex.push_str(&regex::escape(&next.to_string()));
                }
            }
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
    }

    regex.push('$');
    regex
}

/// Fast path for escape-free patterns with a single wildcard run at either end
fn fast_path_like(text: &str, pattern: &str) -> Option<bool> {
    if pattern.contains(LIKE_ESCAPE) || pattern.contains('_') {
        return None;
    }

    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();

    if !pattern.contains('%') {
        return Some(text == pattern);
    }

    let inner = pattern.trim_matches('%');
    if inner.contains('%') {
        return None;
    }

    match (pattern.starts_with('%'), pattern.ends_with('%')) {
        (true, true) => Some(text.contains(inner)),
        (false, true) => Some(text.starts_with(inner)),
        (true, false) => Some(text.ends_with(inner)),
        (false, false) => None,
    }
}

/// Evaluate LIKE the way SQLite does by default: case-insensitive.
///
/// Used when a string predicate only involves constants and is folded
/// before reaching the database.
pub fn eval_like(text: &str, pattern: &str) -> Result<bool> {
    if let Some(result) = fast_path_like(text, pattern) {
        return Ok(result);
    }

    let regex = RegexBuilder::new(&like_to_regex(pattern))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| QueryError::UnsupportedExpression(format!("invalid LIKE pattern: {}", e)))?;
    Ok(regex.is_match(text))
}
