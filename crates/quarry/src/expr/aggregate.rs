use super::{Expr, IntoExpr, Op, Predicate};
use crate::qb::TableRef;

/// An aggregate over one column, e.g. `AVG(`age`)`.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub(crate) table: Option<TableRef>,
    pub(crate) func: &'static str,
    pub(crate) arg: String,
    pub(crate) alias: String,
}

impl Aggregate {
    pub(crate) fn new(table: Option<TableRef>, func: &'static str, arg: impl Into<String>) -> Self {
        Self {
            table,
            func,
            arg: arg.into(),
            alias: String::new(),
        }
    }

    /// Name the result; only rendered in SELECT lists.
    pub fn as_(mut self, alias: impl Into<String>) -> Aggregate {
        self.alias = alias.into();
        self
    }

    fn compare(self, op: Op, arg: impl IntoExpr) -> Predicate {
        Predicate::binary(Expr::Aggregate(self), op, arg.into_expr())
    }

    pub fn eq(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::Eq, arg)
    }

    pub fn ne(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::Ne, arg)
    }

    pub fn lt(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::Lt, arg)
    }

    pub fn le(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::Le, arg)
    }

    pub fn gt(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::Gt, arg)
    }

    pub fn ge(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::Ge, arg)
    }
}

pub fn avg(col: impl Into<String>) -> Aggregate {
    Aggregate::new(None, "AVG", col)
}

pub fn sum(col: impl Into<String>) -> Aggregate {
    Aggregate::new(None, "SUM", col)
}

pub fn max(col: impl Into<String>) -> Aggregate {
    Aggregate::new(None, "MAX", col)
}

pub fn min(col: impl Into<String>) -> Aggregate {
    Aggregate::new(None, "MIN", col)
}

pub fn count(col: impl Into<String>) -> Aggregate {
    Aggregate::new(None, "COUNT", col)
}
