//! Statement builders.
//!
//! Each builder assembles one parameterized statement from expression trees
//! and table references, and renders it through a [`Builder`] into a
//! [`Query`]: SQL text terminated by `;` plus one argument per placeholder.
//!
//! Builders are consuming (`self -> Self`) and hold the session's driver, so
//! they can be executed directly:
//!
//! ```ignore
//! use quarry::prelude::*;
//!
//! let adults: Vec<User> = Selector::<User>::new(&db)
//!     .where_([c("age").ge(18)])
//!     .order_by([asc("id")])
//!     .get_multi()
//!     .await?;
//! ```

mod builder;
mod create;
mod delete;
mod insert;
mod raw;
mod select;
mod table;
mod union;
mod update;

#[cfg(test)]
mod tests;

pub use builder::Builder;
pub use create::Creator;
pub use delete::Deleter;
pub use insert::{Inserter, OnConflict, OnConflictBuilder};
pub use raw::{RawQuerier, raw_query};
pub use select::Selector;
pub use table::{Join, JoinBuilder, JoinKind, Joinable, Subquery, Table, TableRef, table_of};
pub use union::{Union, UnionKind};
pub use update::{Updater, assign_columns, assign_not_nil_columns, assign_not_zero_columns};

use crate::error::OrmResult;
use crate::value::Value;

/// A rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Query {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// SQL without its trailing terminator, for embedding in another statement.
    pub(crate) fn body(&self) -> &str {
        self.sql.strip_suffix(';').unwrap_or(&self.sql)
    }
}

/// Anything that renders to a [`Query`].
pub trait QueryBuilder: Send + Sync {
    fn build(&self) -> OrmResult<Query>;

    /// Table reference the statement reads from, when it has one.
    fn source(&self) -> Option<TableRef> {
        None
    }
}

impl QueryBuilder for Query {
    fn build(&self) -> OrmResult<Query> {
        Ok(self.clone())
    }
}
