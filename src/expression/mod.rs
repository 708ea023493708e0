//! Expression trees the compilers consume, plus value-side folding
//! and LIKE pattern helpers.

pub mod ast;
pub mod eval;
pub mod pattern;

pub use ast::{CompareOp, Expr, FieldBinding, LogicalOp, ObjectConstruction};
pub use eval::{evaluate, evaluate_index};
pub use pattern::StringMatch;
