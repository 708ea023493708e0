//! Canonical document paths
//!
//! A path is an ordered list of segments rooted at `$`. Its textual form is
//! the one SQLite's JSON1 functions accept: `$.Address.City`, `$.Tags[0]`,
//! and `$."first name"` for keys that are not plain identifiers.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::core::{QueryError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    Field(String),
    Index(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    segments: Vec<PathSegment>,
}

impl DocumentPath {
    /// The bare root `$`
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a named field; names that cannot be written inside a JSON path are rejected.
    pub fn field(mut self, name: &str) -> Result<Self> {
        validate_field_name(name)?;
        self.segments.push(PathSegment::Field(name.to_string()));
        Ok(self)
    }

    pub fn index(mut self, index: u64) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Insert a segment at the front. The resolver walks chains outermost
    /// first, so segments arrive in reverse.
    pub(crate) fn prepend(&mut self, segment: PathSegment) -> Result<()> {
        if let PathSegment::Field(name) = &segment {
            validate_field_name(name)?;
        }
        self.segments.insert(0, segment);
        Ok(())
    }

    /// Path rendered as a single-quoted SQL string literal.
    pub fn to_sql_literal(&self) -> String {
        format!("'{}'", self.to_string().replace('\'', "''"))
    }

    /// Parse the canonical textual form back into segments.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            QueryError::UnsupportedExpression(format!("document path {:?}: {}", text, reason))
        };

        let chars: Vec<char> = text.trim().chars().collect();
        if chars.first() != Some(&'$') {
            return Err(invalid("must start with '$'"));
        }

        let mut path = Self::root();
        let mut i = 1;
        while i < chars.len() {
            match chars[i] {
                '.' => {
                    i += 1;
                    if chars.get(i) == Some(&'"') {
                        let start = i + 1;
                        let end = chars[start..]
                            .iter()
                            .position(|c| *c == '"')
                            .map(|p| start + p)
                            .ok_or_else(|| invalid("unterminated quoted key"))?;
                        let name: String = chars[start..end].iter().collect();
                        path = path.field(&name)?;
                        i = end + 1;
                    } else {
                        let start = i;
                        while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                            i += 1;
                        }
                        let name: String = chars[start..i].iter().collect();
                        if name.is_empty() {
                            return Err(invalid("empty key"));
                        }
                        path = path.field(&name)?;
                    }
                }
                '[' => {
                    let start = i + 1;
                    let end = chars[start..]
                        .iter()
                        .position(|c| *c == ']')
                        .map(|p| start + p)
                        .ok_or_else(|| invalid("unterminated index"))?;
                    let digits: String = chars[start..end].iter().collect();
                    let index = digits
                        .parse::<u64>()
                        .map_err(|_| invalid("index must be a non-negative integer"))?;
                    path = path.index(index);
                    i = end + 1;
                }
                c => return Err(invalid(&format!("unexpected character {:?}", c))),
            }
        }

        Ok(path)
    }
}

/// Plain identifiers are written bare, everything else as a quoted key.
pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(QueryError::UnsupportedExpression(
            "member with an empty name".to_string(),
        ));
    }
    if name.chars().any(|c| c == '"' || c.is_control()) {
        return Err(QueryError::UnsupportedExpression(format!(
            "member name {:?} cannot be expressed as a document path",
            name
        )));
    }
    Ok(())
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) if is_plain_identifier(name) => write!(f, ".{}", name)?,
                PathSegment::Field(name) => write!(f, ".\"{}\"", name)?,
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}
