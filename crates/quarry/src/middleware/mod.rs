//! Interceptors around statement execution.
//!
//! A [`Middleware`] turns one [`HandleFn`] into another. The list registered on
//! a [`DB`](crate::DB) is folded from last to first around the terminal
//! handler, so the first registered middleware is the outermost: it sees the
//! [`QueryContext`] first on the way in and the [`QueryResult`] last on the
//! way out.
//!
//! ```ignore
//! use quarry::middleware::{HandleFn, Middleware, QueryContext, QueryResult};
//! use futures_util::future::BoxFuture;
//! use std::sync::Arc;
//!
//! let noop: Middleware = Arc::new(|next: HandleFn| -> HandleFn {
//!     Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> { next(qc) })
//! });
//! ```

#[cfg(feature = "prometheus")]
pub mod prometheus;
pub mod querylog;
pub mod tracing;


use crate::driver::ExecResult;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::qb::{Query, QueryBuilder};
use futures_util::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Statement kind carried through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Raw,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Select => "SELECT",
            QueryKind::Insert => "INSERT",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE",
            QueryKind::Raw => "RAW",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work handed through the chain.
pub struct QueryContext {
    pub kind: QueryKind,
    /// The statement being executed.
    pub builder: Arc<dyn QueryBuilder>,
    /// Model of the statement's entity, when it has one.
    pub model: Option<Arc<Model>>,
    query: OnceLock<Query>,
}

impl QueryContext {
    pub fn new(kind: QueryKind, builder: Arc<dyn QueryBuilder>, model: Option<Arc<Model>>) -> Self {
        Self {
            kind,
            builder,
            model,
            query: OnceLock::new(),
        }
    }

    /// Replace the statement's rendering with `query`.
    ///
    /// Inner handlers run `query` instead of building the statement.
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = OnceLock::from(query);
        self
    }

    /// The rendered statement, built on first access and cached.
    pub fn query(&self) -> OrmResult<&Query> {
        if let Some(q) = self.query.get() {
            return Ok(q);
        }
        let q = self.builder.build()?;
        Ok(self.query.get_or_init(|| q))
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("kind", &self.kind)
            .field("model", &self.model.as_ref().map(|m| &m.table_name))
            .field("query", &self.query.get())
            .finish_non_exhaustive()
    }
}

/// What the terminal handler produced.
pub enum QueryOutput {
    /// Bound records of a read path: `T` for `get`, `Vec<T>` for `get_multi`.
    Records(Box<dyn Any + Send>),
    /// Outcome of a write path.
    Exec(ExecResult),
}

impl QueryOutput {
    pub(crate) fn into_records<T: Any>(self) -> OrmResult<T> {
        match self {
            QueryOutput::Records(any) => any
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| OrmError::Other("middleware replaced the query result type".to_string())),
            QueryOutput::Exec(_) => Err(OrmError::Other("expected records, got an exec result".to_string())),
        }
    }

    pub(crate) fn into_exec(self) -> OrmResult<ExecResult> {
        match self {
            QueryOutput::Exec(res) => Ok(res),
            QueryOutput::Records(_) => Err(OrmError::Other("expected an exec result, got records".to_string())),
        }
    }
}

impl fmt::Debug for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutput::Records(_) => f.write_str("Records(..)"),
            QueryOutput::Exec(res) => f.debug_tuple("Exec").field(res).finish(),
        }
    }
}

pub type QueryResult = OrmResult<QueryOutput>;

/// Handles one query context.
pub type HandleFn = Arc<dyn Fn(QueryContext) -> BoxFuture<'static, QueryResult> + Send + Sync>;

/// Wraps a handler into another.
pub type Middleware = Arc<dyn Fn(HandleFn) -> HandleFn + Send + Sync>;

/// Fold `middlewares` around `handler`; the first one ends up outermost.
pub(crate) fn chain(middlewares: &[Middleware], handler: HandleFn) -> HandleFn {
    middlewares.iter().rev().fold(handler, |next, m| m(next))
}
