//! The database collaborator.
//!
//! quarry never speaks a wire protocol; it hands `(sql, args)` to a [`Driver`]
//! and reads back a materialized [`Rows`] cursor or an [`ExecResult`].

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;

use crate::error::{OrmError, OrmResult};
use crate::value::{FieldValue, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// A result set with a forward-only cursor.
///
/// The cursor starts before the first row; call [`Rows::next_row`] to advance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    cursor: Option<usize>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            cursor: None,
        }
    }

    /// Returned column names, in select order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Advance to the next row. Returns `false` once exhausted.
    pub fn next_row(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.rows.len());
            false
        }
    }

    /// Cells of the row under the cursor.
    pub fn current(&self) -> OrmResult<&[Value]> {
        self.cursor
            .and_then(|c| self.rows.get(c))
            .map(Vec::as_slice)
            .ok_or_else(|| OrmError::Other("row cursor is not on a row".to_string()))
    }

    /// Decode cell `index` of the current row into `F`.
    pub fn scan_value<F: FieldValue>(&self, index: usize) -> OrmResult<F> {
        let column = self.columns.get(index).map(String::as_str).unwrap_or_default();
        let value = self
            .current()?
            .get(index)
            .cloned()
            .ok_or_else(|| OrmError::decode(column, format!("no cell at index {index}")))?;
        F::from_value(value).map_err(|e| e.with_column(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Executes parameterized SQL.
///
/// Placeholders are `?`, matched positionally with `args`.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Run a query and return its rows.
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows>;

    /// Run a statement and return the affected-row handle.
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult>;

    /// Begin a transaction.
    async fn begin(&self) -> OrmResult<Arc<dyn DriverTx>>;
}

/// A driver-level transaction. Statements run through it join the transaction.
///
/// `commit` and `rollback` fail with [`OrmError::TxDone`] once either has
/// succeeded.
#[async_trait]
pub trait DriverTx: Driver {
    async fn commit(&self) -> OrmResult<()>;

    async fn rollback(&self) -> OrmResult<()>;
}
