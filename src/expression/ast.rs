//! Typed expression trees
//!
//! Callers build predicates and projections against the document model with
//! the constructors below, e.g.
//!
//! ```
//! use docsql::expression::Expr;
//!
//! let x = Expr::param();
//! let filter = x.member("Category").equals("Electronics")
//!     .and(x.member("Price").greater_than(20));
//! assert_eq!(filter.to_string(), r#"((x.Category == "Electronics") && (x.Price > 20))"#);
//! ```

use std::fmt;
use serde_json::Value as JsonValue;
use crate::core::Value;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The lambda parameter standing for the stored document
    Parameter,

    /// Member access (`target.name`)
    Member { target: Box<Expr>, name: String },

    /// Array indexer (`target[index]`)
    Index { target: Box<Expr>, index: Box<Expr> },

    /// Literal value
    Constant(Value),

    /// Variable captured from the caller's scope
    Captured { name: String, value: JsonValue },

    /// Binary comparison
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },

    /// Binary logical operation
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    /// Method call on a target (`target.Method(args)`)
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Object construction with named field bindings
    Construct(ObjectConstruction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl CompareOp {
    /// Operator that keeps the meaning when both operands swap sides.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::NotEq => Self::NotEq,
            Self::Gt => Self::Lt,
            Self::GtEq => Self::LtEq,
            Self::Lt => Self::Gt,
            Self::LtEq => Self::GtEq,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Lt => "<",
            Self::LtEq => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// `new T { A = x.A, B = x.B }` or `new { x.A, x.B }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectConstruction {
    /// `None` for anonymous objects
    pub type_name: Option<String>,
    pub bindings: Vec<FieldBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    pub field: String,
    pub source: Expr,
}

impl ObjectConstruction {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, field: impl Into<String>, source: Expr) -> Self {
        self.bindings.push(FieldBinding {
            field: field.into(),
            source,
        });
        self
    }

    pub fn build(self) -> Expr {
        Expr::Construct(self)
    }
}

impl Expr {
    pub fn param() -> Self {
        Self::Parameter
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    pub fn captured(name: impl Into<String>, value: JsonValue) -> Self {
        Self::Captured {
            name: name.into(),
            value,
        }
    }

    pub fn member(&self, name: impl Into<String>) -> Self {
        Self::Member {
            target: Box::new(self.clone()),
            name: name.into(),
        }
    }

    /// Index with a literal position
    pub fn at(&self, index: i64) -> Self {
        self.index(Self::constant(index))
    }

    pub fn index(&self, index: Expr) -> Self {
        Self::Index {
            target: Box::new(self.clone()),
            index: Box::new(index),
        }
    }

    pub fn compare(self, op: CompareOp, other: impl Into<Expr>) -> Self {
        Self::Compare {
            left: Box::new(self),
            op,
            right: Box::new(other.into()),
        }
    }

    pub fn equals(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Eq, other)
    }

    pub fn not_equals(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::NotEq, other)
    }

    pub fn greater_than(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Gt, other)
    }

    pub fn greater_or_equal(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::GtEq, other)
    }

    pub fn less_than(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Lt, other)
    }

    pub fn less_or_equal(self, other: impl Into<Expr>) -> Self {
        self.compare(CompareOp::LtEq, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Self::Logical {
            left: Box::new(self),
            op: LogicalOp::And,
            right: Box::new(other),
        }
    }

    pub fn or(self, other: Expr) -> Self {
        Self::Logical {
            left: Box::new(self),
            op: LogicalOp::Or,
            right: Box::new(other),
        }
    }

    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            target: Box::new(self),
            method: method.into(),
            args,
        }
    }

    pub fn contains(self, value: impl Into<Expr>) -> Self {
        self.call("Contains", vec![value.into()])
    }

    pub fn starts_with(self, value: impl Into<Expr>) -> Self {
        self.call("StartsWith", vec![value.into()])
    }

    pub fn ends_with(self, value: impl Into<Expr>) -> Self {
        self.call("EndsWith", vec![value.into()])
    }

    /// Node kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parameter => "Parameter",
            Self::Member { .. } => "MemberAccess",
            Self::Index { .. } => "ArrayIndex",
            Self::Constant(_) => "Constant",
            Self::Captured { .. } => "CapturedValue",
            Self::Compare { .. } => "Comparison",
            Self::Logical { .. } => "Logical",
            Self::Call { .. } => "MethodCall",
            Self::Construct(_) => "ObjectConstruction",
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Constant(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Constant(value.into())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Constant(value.into())
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Constant(value.into())
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::Constant(value.into())
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Constant(value.into())
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Constant(value.into())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter => write!(f, "x"),
            Expr::Member { target, name } => write!(f, "{}.{}", target, name),
            Expr::Index { target, index } => write!(f, "{}[{}]", target, index),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Captured { name, .. } => write!(f, "{}", name),
            Expr::Compare { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Logical { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Call { target, method, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}.{}({})", target, method, args.join(", "))
            }
            Expr::Construct(object) => {
                let bindings: Vec<String> = object
                    .bindings
                    .iter()
                    .map(|b| format!("{} = {}", b.field, b.source))
                    .collect();
                match &object.type_name {
                    Some(name) => write!(f, "new {} {{ {} }}", name, bindings.join(", ")),
                    None => write!(f, "new {{ {} }}", bindings.join(", ")),
                }
            }
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::GtEq => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::LtEq => write!(f, "<="),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}
