use super::{Column, Expr, IntoExpr};
use crate::error::OrmError;

/// `column = expr` in an UPDATE or upsert clause.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub(crate) column: String,
    pub(crate) value: Expr,
}

/// Assign `value` to the field `column`.
///
/// `value` may be any expression, so `assign("age", c("age").add(1))` renders
/// `` `age` = `age` + ? ``.
pub fn assign(column: impl Into<String>, value: impl IntoExpr) -> Assignment {
    Assignment {
        column: column.into(),
        value: value.into_expr(),
    }
}

/// Anything that may appear on the left of an UPDATE/upsert `SET`.
///
/// A bare column takes its value from the statement's source row: the update
/// template for UPDATE, the inserted row for an upsert.
#[derive(Debug, Clone)]
pub enum Assignable {
    Column(Column),
    Assignment(Assignment),
}

impl From<Column> for Assignable {
    fn from(c: Column) -> Self {
        Assignable::Column(c)
    }
}

impl From<Assignment> for Assignable {
    fn from(a: Assignment) -> Self {
        Assignable::Assignment(a)
    }
}

impl TryFrom<Expr> for Assignable {
    type Error = OrmError;

    fn try_from(e: Expr) -> Result<Self, Self::Error> {
        match e {
            Expr::Column(c) => Ok(Assignable::Column(c)),
            other => Err(OrmError::UnsupportedAssignable(other.kind().to_string())),
        }
    }
}
