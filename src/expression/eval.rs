//! Value-side evaluation
//!
//! Operands that do not address the document are folded to a [`Value`]
//! before compilation: literals, reads through captured variables, and as a
//! last resort comparisons, logical operations and string predicates over
//! those.

use std::cmp::Ordering;
use serde_json::Value as JsonValue;
use crate::core::{QueryError, Result, Value};
use super::ast::{CompareOp, Expr, LogicalOp};
use super::pattern::{StringMatch, eval_like};

pub fn evaluate(expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Constant(value) => Ok(value.clone()),

        Expr::Captured { .. } | Expr::Member { .. } | Expr::Index { .. } => {
            read_captured(expr).map(Value::from_json)
        }

        Expr::Compare { left, op, right } => {
            let (left, right) = (evaluate(left)?, evaluate(right)?);
            let result = match op {
                CompareOp::Eq => left == right,
                CompareOp::NotEq => left != right,
                op => {
                    let ordering = left.compare(&right)?;
                    match op {
                        CompareOp::Gt => ordering == Ordering::Greater,
                        CompareOp::GtEq => ordering != Ordering::Less,
                        CompareOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    }
                }
            };
            Ok(Value::Boolean(result))
        }

        Expr::Logical { left, op, right } => {
            let left = evaluate_bool(left)?;
            let result = match op {
                LogicalOp::And => left && evaluate_bool(right)?,
                LogicalOp::Or => left || evaluate_bool(right)?,
            };
            Ok(Value::Boolean(result))
        }

        Expr::Call { target, method, args } => {
            let kind = StringMatch::from_method(method)
                .ok_or_else(|| QueryError::UnsupportedMethod(method.clone()))?;
            let [needle] = args.as_slice() else {
                return Err(QueryError::UnsupportedExpression(format!(
                    "{} expects exactly one argument, got {}",
                    method,
                    args.len()
                )));
            };
            let target = evaluate(target)?;
            let needle = evaluate(needle)?;
            match (target.as_str(), needle.as_str()) {
                (Some(text), Some(needle)) => Ok(Value::Boolean(eval_like(text, &kind.pattern(needle))?)),
                _ => Err(QueryError::UnsupportedExpression(format!(
                    "{} over {} and {}",
                    method,
                    target.type_name(),
                    needle.type_name()
                ))),
            }
        }

        Expr::Parameter | Expr::Construct(_) => {
            Err(QueryError::UnsupportedExpression(expr.kind().to_string()))
        }
    }
}

/// Evaluate an array index operand: a non-negative integer or `InvalidIndex`.
pub fn evaluate_index(expr: &Expr) -> Result<u64> {
    let value = evaluate(expr).map_err(|e| {
        QueryError::InvalidIndex(format!("{} cannot be evaluated: {}", expr, e))
    })?;
    let index = value
        .as_i64()
        .ok_or_else(|| QueryError::InvalidIndex(format!("{} is {}, not an integer", expr, value.type_name())))?;
    u64::try_from(index).map_err(|_| QueryError::InvalidIndex(format!("{} is negative ({})", expr, index)))
}

fn evaluate_bool(expr: &Expr) -> Result<bool> {
    let value = evaluate(expr)?;
    value.as_bool().ok_or_else(|| {
        QueryError::UnsupportedExpression(format!("{} is {}, not a boolean", expr, value.type_name()))
    })
}

/// Navigate into a captured value; borrows from the expression tree.
fn read_captured(expr: &Expr) -> Result<&JsonValue> {
    match expr {
        Expr::Captured { value, .. } => Ok(value),
        Expr::Member { target, name } => {
            let base = read_captured(target)?;
            base.get(name.as_str()).ok_or_else(|| {
                QueryError::UnsupportedExpression(format!("captured value {} has no member '{}'", target, name))
            })
        }
        Expr::Index { target, index } => {
            let base = read_captured(target)?;
            let position = evaluate_index(index)?;
            usize::try_from(position)
                .ok()
                .and_then(|i| base.get(i))
                .ok_or_else(|| QueryError::InvalidIndex(format!("{} is out of bounds for {}", position, target)))
        }
        other => Err(QueryError::UnsupportedExpression(other.kind().to_string())),
    }
}
