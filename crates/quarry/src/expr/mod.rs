//! Expression trees.
//!
//! Everything that can appear inside a statement is an [`Expr`]: columns,
//! literal values, predicates, arithmetic, aggregates, raw SQL fragments and
//! subqueries. Nodes are immutable and combine by value:
//!
//! ```ignore
//! use quarry::expr::c;
//!
//! let adult = c("age").ge(18).and(c("age").lt(65));
//! ```

mod aggregate;
mod assign;
mod column;
mod predicate;
mod selectable;


pub use aggregate::{Aggregate, avg, count, max, min, sum};
pub use assign::{Assignable, Assignment, assign};
pub use column::{Column, c};
pub use predicate::{Predicate, exists, not};
pub use selectable::{OrderBy, Selectable, asc, desc};

use crate::qb::Subquery;
use crate::value::{FieldValue, Value};
use std::fmt;

/// Binary and unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Like,
    And,
    Or,
    Not,
    Exists,
    Add,
    Sub,
    Multi,
    Div,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::In => "IN",
            Op::Like => "LIKE",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::Exists => "EXISTS",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Multi => "*",
            Op::Div => "/",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Column(Column),
    Value(Value),
    Predicate(Predicate),
    Math(MathExpr),
    Aggregate(Aggregate),
    Raw(RawExpr),
    Subquery(Subquery),
    SubqueryExpr(SubqueryExpr),
}

impl Expr {
    /// Variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Column(_) => "column",
            Expr::Value(_) => "value",
            Expr::Predicate(_) => "predicate",
            Expr::Math(_) => "math expression",
            Expr::Aggregate(_) => "aggregate",
            Expr::Raw(_) => "raw expression",
            Expr::Subquery(_) => "subquery",
            Expr::SubqueryExpr(_) => "subquery expression",
        }
    }
}

/// Conversion into an expression operand.
///
/// Plain field values become placeholders; expression nodes are used as is.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl<T: FieldValue> IntoExpr for T {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        Expr::Value(Value::Text(self.to_string()))
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

macro_rules! impl_into_expr {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expr {
                    Expr::$variant(self)
                }
            }

            impl From<$ty> for Expr {
                fn from(e: $ty) -> Self {
                    Expr::$variant(e)
                }
            }
        )*
    };
}

impl_into_expr!(
    Column => Column,
    Predicate => Predicate,
    MathExpr => Math,
    Aggregate => Aggregate,
    RawExpr => Raw,
    Subquery => Subquery,
    SubqueryExpr => SubqueryExpr,
);

/// Arithmetic over two operands, e.g. `age + 1`.
#[derive(Debug, Clone)]
pub struct MathExpr {
    pub(crate) left: Box<Expr>,
    pub(crate) op: Op,
    pub(crate) right: Box<Expr>,
}

impl MathExpr {
    pub(crate) fn new(left: Expr, op: Op, right: Expr) -> Self {
        Self {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn add(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Math(self), Op::Add, val.into_expr())
    }

    pub fn sub(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Math(self), Op::Sub, val.into_expr())
    }

    pub fn multi(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Math(self), Op::Multi, val.into_expr())
    }

    pub fn div(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Math(self), Op::Div, val.into_expr())
    }
}

/// A literal SQL fragment with its arguments. Never validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExpr {
    pub(crate) sql: String,
    pub(crate) args: Vec<Value>,
}

impl RawExpr {
    /// Use the fragment as a boolean condition.
    pub fn as_predicate(self) -> Predicate {
        Predicate::leaf(Expr::Raw(self))
    }
}

/// Wrap literal SQL. `args` fill its placeholders in order.
pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> RawExpr {
    RawExpr {
        sql: sql.into(),
        args,
    }
}

/// Comparison quantifier in front of a subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    Some,
}

impl Quantifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Quantifier::All => "ALL",
            Quantifier::Any => "ANY",
            Quantifier::Some => "SOME",
        }
    }
}

/// `ALL (..)`, `ANY (..)` or `SOME (..)`.
///
/// Not every database supports all three; the SQL is emitted as is and the
/// database reports what it rejects.
#[derive(Debug, Clone)]
pub struct SubqueryExpr {
    pub(crate) sub: Subquery,
    pub(crate) quantifier: Quantifier,
}

pub fn all(sub: Subquery) -> SubqueryExpr {
    SubqueryExpr {
        sub,
        quantifier: Quantifier::All,
    }
}

pub fn any(sub: Subquery) -> SubqueryExpr {
    SubqueryExpr {
        sub,
        quantifier: Quantifier::Any,
    }
}

pub fn some(sub: Subquery) -> SubqueryExpr {
    SubqueryExpr {
        sub,
        quantifier: Quantifier::Some,
    }
}
