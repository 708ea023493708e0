use std::collections::HashSet;
use crate::core::{DocumentPath, QueryError, Result};
use crate::expression::Expr;
use super::path_resolver::{is_document_path, resolve_path};

/// Result field -> source path, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledProjection {
    fields: Vec<(String, DocumentPath)>,
}

impl CompiledProjection {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&DocumentPath> {
        self.fields.iter().find(|(f, _)| f == field).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentPath)> {
        self.fields.iter().map(|(f, p)| (f.as_str(), p))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(f, _)| f.as_str())
    }
}

/// Compile an object construction whose every binding is a plain path access
pub fn compile_projection(expr: &Expr) -> Result<CompiledProjection> {
    let Expr::Construct(object) = expr else {
        return Err(QueryError::UnsupportedExpression(format!(
            "{} as projection",
            expr.kind()
        )));
    };

    if object.bindings.is_empty() {
        return Err(QueryError::UnsupportedExpression(
            "ObjectConstruction without bindings".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(object.bindings.len());

    for binding in &object.bindings {
        let field = binding.field.as_str();
        let unsupported = |reason: String| QueryError::UnsupportedProjection {
            field: field.to_string(),
            reason,
        };

        if field.is_empty() || field.chars().any(char::is_control) {
            return Err(unsupported("field name cannot be used as a column alias".to_string()));
        }
        if !seen.insert(field) {
            return Err(unsupported("field is bound more than once".to_string()));
        }
        if !is_document_path(&binding.source) {
            return Err(unsupported(format!(
                "{} is not a document path",
                binding.source.kind()
            )));
        }

        fields.push((field.to_string(), resolve_path(&binding.source)?));
    }

    Ok(CompiledProjection { fields })
}
