//! State shared by every statement of a session, and the terminal handlers
//! that run a statement through the middleware chain.

use crate::dialect::Dialect;
use crate::driver::{Driver, ExecResult};
use crate::error::{OrmError, OrmResult};
use crate::middleware::{HandleFn, Middleware, QueryContext, QueryOutput, QueryResult, chain};
use crate::model::{Entity, Registry};
use crate::qb::{Creator, Deleter, Inserter, RawQuerier, Selector, Updater};
use crate::valuer::ValuerKind;
use crate::value::Value;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Registry, dialect, binder strategy and middlewares of a session.
#[derive(Clone)]
pub struct Core {
    pub(crate) registry: Arc<Registry>,
    pub(crate) dialect: &'static dyn Dialect,
    pub(crate) valuer: ValuerKind,
    pub(crate) middlewares: Arc<[Middleware]>,
}

impl Core {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn valuer(&self) -> ValuerKind {
        self.valuer
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("dialect", &self.dialect.name())
            .field("valuer", &self.valuer)
            .field("models", &self.registry.len())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Something statements run against: a [`DB`](crate::DB) or a [`Tx`](crate::Tx).
pub trait Session: Send + Sync {
    fn core(&self) -> &Core;

    /// Driver statements are sent to.
    fn driver(&self) -> Arc<dyn Driver>;

    fn select<T: Entity>(&self) -> Selector<T>
    where
        Self: Sized,
    {
        Selector::new(self)
    }

    fn insert<T: Entity>(&self) -> Inserter<T>
    where
        Self: Sized,
    {
        Inserter::new(self)
    }

    fn update<T: Entity>(&self) -> Updater<T>
    where
        Self: Sized,
    {
        Updater::new(self)
    }

    fn delete<T: Entity>(&self) -> Deleter<T>
    where
        Self: Sized,
    {
        Deleter::new(self)
    }

    fn create_table<T: Entity>(&self) -> Creator<T>
    where
        Self: Sized,
    {
        Creator::new(self)
    }

    fn raw_query<T: Entity>(&self, sql: impl Into<String>, args: Vec<Value>) -> RawQuerier<T>
    where
        Self: Sized,
    {
        RawQuerier::new(self, sql, args)
    }
}

/// Run `qc` through the chain and bind the first row into a `T`.
pub(crate) async fn get<T: Entity>(
    core: &Core,
    driver: Arc<dyn Driver>,
    qc: QueryContext,
) -> OrmResult<T> {
    let valuer = core.valuer;
    let handler: HandleFn = Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> {
        let driver = Arc::clone(&driver);
        Box::pin(async move {
            let q = qc.query()?;
            let mut rows = driver.query(&q.sql, &q.args).await?;
            if !rows.next_row() {
                return Err(OrmError::not_found("no rows in result set"));
            }
            let mut t = T::default();
            valuer.scan(&mut t, qc.model.as_deref(), &rows)?;
            Ok(QueryOutput::Records(Box::new(t)))
        })
    });
    chain(&core.middlewares, handler)(qc).await?.into_records()
}

/// Run `qc` through the chain and bind every row. Zero rows is not an error.
pub(crate) async fn get_multi<T: Entity>(
    core: &Core,
    driver: Arc<dyn Driver>,
    qc: QueryContext,
) -> OrmResult<Vec<T>> {
    let valuer = core.valuer;
    let handler: HandleFn = Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> {
        let driver = Arc::clone(&driver);
        Box::pin(async move {
            let q = qc.query()?;
            let mut rows = driver.query(&q.sql, &q.args).await?;
            let mut res: Vec<T> = Vec::with_capacity(rows.len());
            while rows.next_row() {
                let mut t = T::default();
                valuer.scan(&mut t, qc.model.as_deref(), &rows)?;
                res.push(t);
            }
            Ok(QueryOutput::Records(Box::new(res)))
        })
    });
    chain(&core.middlewares, handler)(qc).await?.into_records()
}

/// Run `qc` through the chain as a statement without result rows.
pub(crate) async fn exec(
    core: &Core,
    driver: Arc<dyn Driver>,
    qc: QueryContext,
) -> OrmResult<ExecResult> {
    let handler: HandleFn = Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> {
        let driver = Arc::clone(&driver);
        Box::pin(async move {
            let q = qc.query()?;
            let res = driver.execute(&q.sql, &q.args).await?;
            Ok(QueryOutput::Exec(res))
        })
    });
    chain(&core.middlewares, handler)(qc).await?.into_exec()
}
