use super::{QueryBuilder, Union};
use crate::error::OrmResult;
use crate::expr::{Aggregate, Column, Predicate, Selectable};
use crate::model::{Entity, Model, Registry};
use std::fmt;
use std::sync::Arc;

/// Anything that can follow `FROM`.
#[derive(Debug, Clone)]
pub enum TableRef {
    Table(Table),
    Join(Join),
    Subquery(Subquery),
    Union(Union),
}

impl TableRef {
    /// Alias qualifying this reference's columns, empty when none.
    pub fn alias(&self) -> &str {
        match self {
            TableRef::Table(t) => &t.alias,
            TableRef::Subquery(s) => &s.alias,
            TableRef::Join(_) | TableRef::Union(_) => "",
        }
    }
}

impl From<Table> for TableRef {
    fn from(t: Table) -> Self {
        TableRef::Table(t)
    }
}

impl From<Join> for TableRef {
    fn from(j: Join) -> Self {
        TableRef::Join(j)
    }
}

impl From<Subquery> for TableRef {
    fn from(s: Subquery) -> Self {
        TableRef::Subquery(s)
    }
}

impl From<Union> for TableRef {
    fn from(u: Union) -> Self {
        TableRef::Union(u)
    }
}

/// The table of an entity type, optionally aliased.
#[derive(Clone)]
pub struct Table {
    model_of: fn(&Registry) -> OrmResult<Arc<Model>>,
    entity: &'static str,
    pub(crate) alias: String,
}

/// Table of `T`.
pub fn table_of<T: Entity>() -> Table {
    Table {
        model_of: Registry::get::<T>,
        entity: std::any::type_name::<T>(),
        alias: String::new(),
    }
}

impl Table {
    pub fn as_(mut self, alias: impl Into<String>) -> Table {
        self.alias = alias.into();
        self
    }

    /// Column of this table, qualified by its alias when it has one.
    pub fn c(&self, name: impl Into<String>) -> Column {
        Column::of(TableRef::Table(self.clone()), name)
    }

    pub fn avg(&self, col: impl Into<String>) -> Aggregate {
        Aggregate::new(Some(TableRef::Table(self.clone())), "AVG", col)
    }

    pub fn sum(&self, col: impl Into<String>) -> Aggregate {
        Aggregate::new(Some(TableRef::Table(self.clone())), "SUM", col)
    }

    pub fn max(&self, col: impl Into<String>) -> Aggregate {
        Aggregate::new(Some(TableRef::Table(self.clone())), "MAX", col)
    }

    pub fn min(&self, col: impl Into<String>) -> Aggregate {
        Aggregate::new(Some(TableRef::Table(self.clone())), "MIN", col)
    }

    pub fn count(&self, col: impl Into<String>) -> Aggregate {
        Aggregate::new(Some(TableRef::Table(self.clone())), "COUNT", col)
    }

    /// Type name of the entity.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub(crate) fn model(&self, registry: &Registry) -> OrmResult<Arc<Model>> {
        (self.model_of)(registry)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("entity", &self.entity)
            .field("alias", &self.alias)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// Two table references joined with `ON` predicates or a `USING` list.
#[derive(Debug, Clone)]
pub struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) left: Box<TableRef>,
    pub(crate) right: Box<TableRef>,
    pub(crate) on: Vec<Predicate>,
    pub(crate) using: Vec<String>,
}

/// A join waiting for its condition.
#[derive(Debug, Clone)]
pub struct JoinBuilder {
    kind: JoinKind,
    left: TableRef,
    right: TableRef,
}

impl JoinBuilder {
    /// Join on predicates, AND-ed together.
    pub fn on(self, ps: impl IntoIterator<Item = Predicate>) -> Join {
        Join {
            kind: self.kind,
            left: Box::new(self.left),
            right: Box::new(self.right),
            on: ps.into_iter().collect(),
            using: Vec::new(),
        }
    }

    /// Join on equally named fields.
    pub fn using<I, S>(self, cols: I) -> Join
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Join {
            kind: self.kind,
            left: Box::new(self.left),
            right: Box::new(self.right),
            on: Vec::new(),
            using: cols.into_iter().map(Into::into).collect(),
        }
    }
}

/// Table references that can start a join.
pub trait Joinable: Into<TableRef> {
    fn join(self, target: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder {
            kind: JoinKind::Inner,
            left: self.into(),
            right: target.into(),
        }
    }

    fn left_join(self, target: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder {
            kind: JoinKind::Left,
            left: self.into(),
            right: target.into(),
        }
    }

    fn right_join(self, target: impl Into<TableRef>) -> JoinBuilder {
        JoinBuilder {
            kind: JoinKind::Right,
            left: self.into(),
            right: target.into(),
        }
    }
}

impl Joinable for Table {}
impl Joinable for Join {}
impl Joinable for Subquery {}

/// A statement used as a table or an operand.
///
/// Its exposed columns are either exactly the selected list or, when nothing
/// was selected, every column of its source.
#[derive(Clone)]
pub struct Subquery {
    pub(crate) builder: Arc<dyn QueryBuilder>,
    pub(crate) table: Option<Box<TableRef>>,
    pub(crate) columns: Vec<Selectable>,
    pub(crate) alias: String,
}

impl Subquery {
    pub(crate) fn new(
        builder: Arc<dyn QueryBuilder>,
        table: Option<TableRef>,
        columns: Vec<Selectable>,
        alias: String,
    ) -> Self {
        Self {
            builder,
            table: table.map(Box::new),
            columns,
            alias,
        }
    }

    /// Column exposed by this subquery.
    pub fn c(&self, name: impl Into<String>) -> Column {
        Column::of(TableRef::Subquery(self.clone()), name)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl fmt::Debug for Subquery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subquery")
            .field("alias", &self.alias)
            .field("table", &self.table)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}
