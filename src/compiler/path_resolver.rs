use crate::core::{DocumentPath, PathSegment, QueryError, Result};
use crate::expression::{Expr, evaluate_index};

/// True when `expr` is a member/index chain ending at the lambda parameter.
///
/// Structural only: `x.Items[x.Count]` is a chain, it just fails to resolve.
pub fn is_document_path(expr: &Expr) -> bool {
    match expr {
        Expr::Parameter => true,
        Expr::Member { target, .. } | Expr::Index { target, .. } => is_document_path(target),
        _ => false,
    }
}

/// Resolve a member/index chain to its canonical document path.
///
/// The chain is unwound from the outermost access inward, so each segment
/// is prepended as it is met.
pub fn resolve_path(expr: &Expr) -> Result<DocumentPath> {
    let mut path = DocumentPath::root();
    let mut current = expr;

    loop {
        match current {
            Expr::Parameter => return Ok(path),
            Expr::Member { target, name } => {
                path.prepend(PathSegment::Field(name.clone()))?;
                current = target;
            }
            Expr::Index { target, index } => {
                path.prepend(PathSegment::Index(evaluate_index(index)?))?;
                current = target;
            }
            other => {
                return Err(QueryError::UnsupportedExpression(format!(
                    "{} in document path {}",
                    other.kind(),
                    expr
                )));
            }
        }
    }
}
