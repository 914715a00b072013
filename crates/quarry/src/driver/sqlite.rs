//! In-process SQLite driver backed by `rusqlite`.
//!
//! All calls run on tokio's blocking pool with the connection behind a mutex.
//! A transaction holds the same connection, so statements issued through the
//! parent driver while it is open run inside it too. Dropping an unfinished
//! transaction rolls it back.

use super::{Driver, DriverTx, ExecResult, Rows};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// SQLite driver. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct SqliteDriver {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver").finish_non_exhaustive()
    }
}

impl SqliteDriver {
    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<R, F>(&self, f: F) -> OrmResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&Connection) -> OrmResult<R> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await?
    }
}

fn to_sql_value(value: &Value) -> OrmResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::I8(n) => SqlValue::Integer((*n).into()),
        Value::I16(n) => SqlValue::Integer((*n).into()),
        Value::I32(n) => SqlValue::Integer((*n).into()),
        Value::I64(n) => SqlValue::Integer(*n),
        Value::U8(n) => SqlValue::Integer((*n).into()),
        Value::U16(n) => SqlValue::Integer((*n).into()),
        Value::U32(n) => SqlValue::Integer((*n).into()),
        Value::U64(n) => SqlValue::Integer(
            i64::try_from(*n).map_err(|_| OrmError::driver(format!("{n} overflows INTEGER")))?,
        ),
        Value::F32(f) => SqlValue::Real((*f).into()),
        Value::F64(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::DateTime(dt) => SqlValue::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Uuid(u) => SqlValue::Text(u.hyphenated().to_string()),
        Value::Json(j) => SqlValue::Text(j.to_string()),
    })
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::I64(n),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn to_params(args: &[Value]) -> OrmResult<Vec<SqlValue>> {
    args.iter().map(to_sql_value).collect()
}

fn run_query(conn: &Connection, sql: &str, args: &[SqlValue]) -> OrmResult<Rows> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let mut cursor = stmt.query(params_from_iter(args.iter()))?;
    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(from_sql_value(row.get_ref(i)?));
        }
        rows.push(cells);
    }
    Ok(Rows::new(columns, rows))
}

fn run_execute(conn: &Connection, sql: &str, args: &[SqlValue]) -> OrmResult<ExecResult> {
    let affected = conn.execute(sql, params_from_iter(args.iter()))?;
    Ok(ExecResult {
        rows_affected: affected as u64,
        last_insert_id: Some(conn.last_insert_rowid()),
    })
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        let sql = sql.to_string();
        let params = to_params(args)?;
        self.with_conn(move |conn| run_query(conn, &sql, &params))
            .await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let sql = sql.to_string();
        let params = to_params(args)?;
        self.with_conn(move |conn| run_execute(conn, &sql, &params))
            .await
    }

    async fn begin(&self) -> OrmResult<Arc<dyn DriverTx>> {
        self.with_conn(|conn| Ok(conn.execute_batch("BEGIN")?))
            .await?;
        Ok(Arc::new(SqliteTx {
            driver: self.clone(),
            done: AtomicBool::new(false),
        }))
    }
}

struct SqliteTx {
    driver: SqliteDriver,
    done: AtomicBool,
}

impl SqliteTx {
    /// Run COMMIT or ROLLBACK. The transaction only counts as finished once
    /// the statement succeeded, so a failed COMMIT can still be rolled back.
    async fn finish(&self, stmt: &'static str) -> OrmResult<()> {
        if self.done.load(Ordering::SeqCst) {
            return Err(OrmError::TxDone);
        }
        self.driver
            .with_conn(move |conn| Ok(conn.execute_batch(stmt)?))
            .await?;
        self.done.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A transaction abandoned without COMMIT or ROLLBACK is rolled back here,
/// otherwise the shared connection would stay inside it.
impl Drop for SqliteTx {
    fn drop(&mut self) {
        if *self.done.get_mut() {
            return;
        }
        let conn = self
            .driver
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if conn.is_autocommit() {
            return;
        }
        match conn.execute_batch("ROLLBACK") {
            Ok(()) => tracing::debug!(target: "quarry.tx", "rolled back abandoned transaction"),
            Err(err) => tracing::warn!(
                target: "quarry.tx",
                error = %err,
                "rollback of abandoned transaction failed"
            ),
        }
    }
}

#[async_trait]
impl Driver for SqliteTx {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        if self.done.load(Ordering::SeqCst) {
            return Err(OrmError::TxDone);
        }
        self.driver.query(sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        if self.done.load(Ordering::SeqCst) {
            return Err(OrmError::TxDone);
        }
        self.driver.execute(sql, args).await
    }

    async fn begin(&self) -> OrmResult<Arc<dyn DriverTx>> {
        Err(OrmError::driver("nested transactions are not supported"))
    }
}

#[async_trait]
impl DriverTx for SqliteTx {
    async fn commit(&self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }
}
