//! # quarry
//!
//! A struct-mapped SQL builder and ORM core for MySQL and SQLite.
//!
//! ## Features
//!
//! - **Entity mapping**: `#[derive(Entity)]` maps a struct to a table, with
//!   column names derived from field names (`FirstName` → `first_name`) and
//!   overridable through `#[orm(column = "..")]`
//! - **Expression trees**: columns, predicates, arithmetic, aggregates, raw
//!   fragments and subqueries compose by value
//! - **Statement builders**: SELECT (joins, subqueries, unions), INSERT with
//!   upsert, UPDATE, DELETE and raw statements, all parameterized
//! - **Dialects**: MySQL and SQLite quoting, column types and upsert syntax
//! - **Middleware**: every statement runs through a chain of interceptors;
//!   a query-log middleware ships in [`middleware::querylog`]
//! - **Transactions**: [`Tx`] works anywhere a [`DB`] does
//!
//! ## Example
//!
//! ```ignore
//! use quarry::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Entity, Debug, Default)]
//! struct User {
//!     id: i64,
//!     first_name: String,
//!     age: i8,
//! }
//!
//! let db = DB::open("sqlite3", Arc::new(SqliteDriver::open_in_memory()?))?;
//! db.create_table::<User>().exec().await?;
//! db.insert::<User>()
//!     .values([User { id: 1, first_name: "Tom".into(), age: 18 }])
//!     .exec()
//!     .await?;
//! let tom: User = db.select::<User>().where_([c("id").eq(1)]).get().await?;
//! ```

// Lets generated code refer to `::quarry` from inside this crate too.
extern crate self as quarry;

mod buffer;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod expr;
pub mod middleware;
pub mod model;
pub mod prelude;
pub mod qb;
pub mod session;
pub mod transaction;
pub mod value;
pub mod valuer;

pub use db::{DB, DbOptions};
pub use dialect::{Dialect, MYSQL, SQLITE};
pub use driver::{Driver, DriverTx, ExecResult, Rows};
pub use error::{OrmError, OrmResult};
pub use model::{Entity, EntityKind, Model, ModelOption, Registry};
pub use qb::{Query, QueryBuilder};
pub use session::{Core, Session};
pub use transaction::Tx;
pub use value::{FieldValue, Value};
pub use valuer::ValuerKind;

#[cfg(feature = "sqlite")]
pub use driver::SqliteDriver;

#[cfg(feature = "derive")]
pub use quarry_derive::Entity;
