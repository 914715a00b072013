use super::{Expr, IntoExpr, MathExpr, Op, Predicate, RawExpr};
use crate::qb::TableRef;
use crate::value::Value;

/// A column referenced by its logical field name.
///
/// Without an owning table it resolves against the statement's model; columns
/// created through [`Table::c`](crate::qb::Table::c) or
/// [`Subquery::c`](crate::qb::Subquery::c) resolve against that reference.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) table: Option<TableRef>,
    pub(crate) name: String,
    pub(crate) alias: String,
}

/// Column of the statement's own model.
pub fn c(name: impl Into<String>) -> Column {
    Column {
        table: None,
        name: name.into(),
        alias: String::new(),
    }
}

impl Column {
    pub(crate) fn of(table: TableRef, name: impl Into<String>) -> Self {
        Column {
            table: Some(table),
            name: name.into(),
            alias: String::new(),
        }
    }

    /// Logical field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Select the column under another name.
    pub fn as_(mut self, alias: impl Into<String>) -> Column {
        self.alias = alias.into();
        self
    }

    fn compare(self, op: Op, arg: impl IntoExpr) -> Predicate {
        Predicate::binary(Expr::Column(self), op, arg.into_expr())
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

    pub fn like(self, pattern: impl IntoExpr) -> Predicate {
        self.compare(Op::Like, pattern)
    }

    /// `col IN <arg>`, typically a subquery.
    pub fn in_(self, arg: impl IntoExpr) -> Predicate {
        self.compare(Op::In, arg)
    }

    /// `col IN (?,?,..)` with one placeholder per value.
    ///
    /// An empty list renders `IN (NULL)`, which matches no row.
    pub fn in_values<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let args: Vec<Value> = values.into_iter().map(Into::into).collect();
        let sql = if args.is_empty() {
            "(NULL)".to_string()
        } else {
            format!("({})", vec!["?"; args.len()].join(","))
        };
        self.compare(Op::In, RawExpr { sql, args })
    }

    pub fn add(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Column(self), Op::Add, val.into_expr())
    }

    pub fn sub(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Column(self), Op::Sub, val.into_expr())
    }

    pub fn multi(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Column(self), Op::Multi, val.into_expr())
    }

    pub fn div(self, val: impl IntoExpr) -> MathExpr {
        MathExpr::new(Expr::Column(self), Op::Div, val.into_expr())
    }
}
