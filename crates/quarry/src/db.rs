//! Database handle and its options.

use crate::dialect::{self, Dialect};
use crate::driver::Driver;
use crate::error::OrmResult;
use crate::middleware::Middleware;
use crate::model::Registry;
use crate::session::{Core, Session};
use crate::transaction::{self, Tx};
use crate::valuer::ValuerKind;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Options for [`DB::open_with`].
#[derive(Clone, Default)]
pub struct DbOptions {
    dialect: Option<&'static dyn Dialect>,
    registry: Option<Arc<Registry>>,
    valuer: ValuerKind,
    middlewares: Vec<Middleware>,
}

impl DbOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dialect` instead of the one registered for the driver name.
    pub fn with_dialect(mut self, dialect: &'static dyn Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Share a model registry with other handles.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Select the binder strategy. Defaults to [`ValuerKind::Reflect`].
    pub fn with_valuer(mut self, valuer: ValuerKind) -> Self {
        self.valuer = valuer;
        self
    }

    /// Middlewares run around every statement; the first one is outermost.
    pub fn with_middlewares(mut self, middlewares: impl IntoIterator<Item = Middleware>) -> Self {
        self.middlewares = middlewares.into_iter().collect();
        self
    }
}

impl fmt::Debug for DbOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbOptions")
            .field("dialect", &self.dialect.map(|d| d.name()))
            .field("valuer", &self.valuer)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// A database handle: a driver plus everything statements share.
///
/// Cheap to clone; clones share the registry and driver.
///
/// # Example
///
/// ```ignore
/// use quarry::prelude::*;
/// use std::sync::Arc;
///
/// let driver = Arc::new(SqliteDriver::open_in_memory()?);
/// let db = DB::open("sqlite3", driver)?;
/// let user: User = db.select::<User>().where_([c("id").eq(1)]).get().await?;
/// ```
#[derive(Clone)]
pub struct DB {
    core: Core,
    driver: Arc<dyn Driver>,
}

impl DB {
    /// Open a handle with default options; the dialect follows `driver_name`.
    pub fn open(driver_name: &str, driver: Arc<dyn Driver>) -> OrmResult<Self> {
        Self::open_with(driver_name, driver, DbOptions::default())
    }

    pub fn open_with(driver_name: &str, driver: Arc<dyn Driver>, opts: DbOptions) -> OrmResult<Self> {
        let dialect = match opts.dialect {
            Some(d) => d,
            None => dialect::dialect_of(driver_name)?,
        };
        let core = Core {
            registry: opts.registry.unwrap_or_default(),
            dialect,
            valuer: opts.valuer,
            middlewares: opts.middlewares.into(),
        };
        tracing::debug!(
            target: "quarry.db",
            driver = driver_name,
            dialect = dialect.name(),
            valuer = ?core.valuer,
            "opened database"
        );
        Ok(Self { core, driver })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.core.registry
    }

    /// Start a transaction. Statements built on the returned [`Tx`] join it.
    pub async fn begin_tx(&self) -> OrmResult<Tx> {
        let inner = self.driver.begin().await?;
        tracing::debug!(target: "quarry.tx", "begin");
        Ok(Tx::new(self.core.clone(), inner))
    }

    /// Run `f` in a transaction.
    ///
    /// Commits when `f` returns `Ok`. Rolls back when it returns `Err` or
    /// panics; a panic comes back as [`OrmError::Panicked`](crate::OrmError::Panicked).
    /// If the rollback itself fails, the result is
    /// [`OrmError::RollbackFailed`](crate::OrmError::RollbackFailed).
    ///
    /// ```ignore
    /// db.do_tx(|tx| Box::pin(async move {
    ///     tx.insert::<User>().values([user]).exec().await?;
    ///     Ok(())
    /// }))
    /// .await?;
    /// ```
    pub async fn do_tx<F, R>(&self, f: F) -> OrmResult<R>
    where
        F: for<'t> FnOnce(&'t Tx) -> BoxFuture<'t, OrmResult<R>>,
    {
        let tx = self.begin_tx().await?;
        transaction::run(tx, f).await
    }
}

impl Session for DB {
    fn core(&self) -> &Core {
        &self.core
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }
}

impl fmt::Debug for DB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DB").field("core", &self.core).finish_non_exhaustive()
    }
}
