use super::{Aggregate, Column, Expr, RawExpr};
use crate::error::OrmError;
use crate::qb::TableRef;

/// Anything that may appear in a SELECT list.
#[derive(Debug, Clone)]
pub enum Selectable {
    Column(Column),
    Aggregate(Aggregate),
    Raw(RawExpr),
}

impl Selectable {
    /// Alias introduced with `AS`, empty when none.
    pub(crate) fn selected_alias(&self) -> &str {
        match self {
            Selectable::Column(c) => &c.alias,
            Selectable::Aggregate(a) => &a.alias,
            Selectable::Raw(_) => "",
        }
    }

    /// Field this item exposes under its own name, empty when none.
    pub(crate) fn field_name(&self) -> &str {
        match self {
            Selectable::Column(c) => &c.name,
            Selectable::Aggregate(_) | Selectable::Raw(_) => "",
        }
    }

    /// Table reference the item resolves against.
    pub(crate) fn target(&self) -> Option<&TableRef> {
        match self {
            Selectable::Column(c) => c.table.as_ref(),
            Selectable::Aggregate(a) => a.table.as_ref(),
            Selectable::Raw(_) => None,
        }
    }
}

impl From<Column> for Selectable {
    fn from(c: Column) -> Self {
        Selectable::Column(c)
    }
}

impl From<Aggregate> for Selectable {
    fn from(a: Aggregate) -> Self {
        Selectable::Aggregate(a)
    }
}

impl From<RawExpr> for Selectable {
    fn from(r: RawExpr) -> Self {
        Selectable::Raw(r)
    }
}

impl TryFrom<Expr> for Selectable {
    type Error = OrmError;

    fn try_from(e: Expr) -> Result<Self, Self::Error> {
        match e {
            Expr::Column(c) => Ok(Selectable::Column(c)),
            Expr::Aggregate(a) => Ok(Selectable::Aggregate(a)),
            Expr::Raw(r) => Ok(Selectable::Raw(r)),
            other => Err(OrmError::UnsupportedSelectable(other.kind().to_string())),
        }
    }
}

/// One ORDER BY item: a field of the statement's model and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub(crate) column: String,
    pub(crate) order: &'static str,
}

pub fn asc(col: impl Into<String>) -> OrderBy {
    OrderBy {
        column: col.into(),
        order: "ASC",
    }
}

pub fn desc(col: impl Into<String>) -> OrderBy {
    OrderBy {
        column: col.into(),
        order: "DESC",
    }
}
