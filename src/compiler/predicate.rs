//! Boolean expression -> parameterized WHERE fragment
//!
//! Every value the caller supplies becomes a named parameter. The fragment
//! text is built only from column references, operators and placeholders
//! the compiler generates itself.

use log::debug;
use crate::core::{QueryError, Result, Value};
use crate::expression::pattern::LIKE_ESCAPE;
use crate::expression::{CompareOp, Expr, StringMatch, evaluate};
use super::column::ColumnResolver;
use super::params::Parameters;
use super::path_resolver::{is_document_path, resolve_path};

/// A compiled filter: WHERE text plus one parameter per placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub where_text: String,
    pub parameters: Parameters,
}

/// Single-use compiler; the parameter counter lives for one compilation
pub struct PredicateCompiler<'a> {
    resolver: ColumnResolver<'a>,
    parameters: Parameters,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(resolver: ColumnResolver<'a>) -> Self {
        Self {
            resolver,
            parameters: Parameters::new(),
        }
    }

    pub fn compile(mut self, expr: &Expr) -> Result<CompiledPredicate> {
        let where_text = self.visit(expr)?;
        debug!("compiled predicate {} -> {}", expr, where_text);
        Ok(CompiledPredicate {
            where_text,
            parameters: self.parameters,
        })
    }

    fn visit(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Compare { left, op, right } => self.comparison(expr, left, *op, right),

            Expr::Logical { left, op, right } => {
                let left = self.visit(left)?;
                let right = self.visit(right)?;
                Ok(format!("({} {} {})", left, op.sql(), right))
            }

            Expr::Call { target, method, args } => self.string_predicate(target, method, args),

            Expr::Parameter
            | Expr::Member { .. }
            | Expr::Index { .. }
            | Expr::Constant(_)
            | Expr::Captured { .. }
            | Expr::Construct(_) => Err(QueryError::UnsupportedExpression(expr.kind().to_string())),
        }
    }

    fn comparison(&mut self, expr: &Expr, left: &Expr, op: CompareOp, right: &Expr) -> Result<String> {
        let (path_side, value_side, op) = match (is_document_path(left), is_document_path(right)) {
            (true, false) => (left, right, op),
            (false, true) => (right, left, op.mirrored()),
            (true, true) => {
                return Err(QueryError::AmbiguousComparison(format!(
                    "both sides of {} address the document",
                    expr
                )));
            }
            (false, false) => {
                return Err(QueryError::AmbiguousComparison(format!(
                    "neither side of {} addresses the document",
                    expr
                )));
            }
        };

        let column = self.resolver.resolve(&resolve_path(path_side)?);
        let placeholder = self.bind(evaluate(value_side)?);
        Ok(format!("{} {} {}", column, op.sql(), placeholder))
    }

    fn string_predicate(&mut self, target: &Expr, method: &str, args: &[Expr]) -> Result<String> {
        let kind = StringMatch::from_method(method)
            .ok_or_else(|| QueryError::UnsupportedMethod(method.to_string()))?;

        let [needle] = args else {
            return Err(QueryError::UnsupportedExpression(format!(
                "{} with {} arguments",
                method,
                args.len()
            )));
        };

        if !is_document_path(target) {
            return Err(QueryError::UnsupportedExpression(format!(
                "{} on {}, which does not address the document",
                method,
                target.kind()
            )));
        }

        let column = self.resolver.resolve(&resolve_path(target)?);
        let needle = evaluate(needle)?;
        let Some(text) = needle.as_str() else {
            return Err(QueryError::UnsupportedExpression(format!(
                "{} argument of type {}",
                method,
                needle.type_name()
            )));
        };

        let placeholder = self.bind(Value::Text(kind.pattern(text)));
        Ok(format!("{} LIKE {} ESCAPE '{}'", column, placeholder, LIKE_ESCAPE))
    }

    fn bind(&mut self, value: Value) -> String {
        let name = format!(
            "{}{}",
            self.resolver.config().parameter_prefix,
            self.parameters.len()
        );
        let placeholder = format!("@{}", name);
        self.parameters.insert(name, value);
        placeholder
    }
}
