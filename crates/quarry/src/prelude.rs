//! Everything needed to build and run statements.

pub use crate::db::{DB, DbOptions};
pub use crate::error::{OrmError, OrmResult};
pub use crate::expr::{
    Assignable, Expr, IntoExpr, Predicate, all, any, asc, assign, avg, c, count, desc, exists,
    max, min, not, raw, some, sum,
};
pub use crate::model::Entity;
pub use crate::qb::{
    Joinable, Query, QueryBuilder, Selector, assign_columns, assign_not_nil_columns,
    assign_not_zero_columns, raw_query, table_of,
};
pub use crate::session::Session;
pub use crate::transaction::Tx;
pub use crate::value::Value;

#[cfg(feature = "sqlite")]
pub use crate::driver::SqliteDriver;

#[cfg(feature = "derive")]
pub use quarry_derive::Entity;
