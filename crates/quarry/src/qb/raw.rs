use super::{Query, QueryBuilder};
use crate::driver::{Driver, ExecResult};
use crate::error::OrmResult;
use crate::middleware::{QueryContext, QueryKind};
use crate::model::{Entity, Model};
use crate::session::{self, Core, Session};
use crate::value::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// A literal statement that still runs through the middleware chain and the
/// binder.
///
/// `T` may be a struct entity or a scalar such as `i64` for single-column
/// results.
pub struct RawQuerier<T> {
    core: Core,
    driver: Arc<dyn Driver>,
    query: Query,
    _entity: PhantomData<fn() -> T>,
}

/// Shorthand for [`RawQuerier::new`].
pub fn raw_query<T: Entity, S: Session + ?Sized>(
    sess: &S,
    sql: impl Into<String>,
    args: Vec<Value>,
) -> RawQuerier<T> {
    RawQuerier::new(sess, sql, args)
}

impl<T: Entity> RawQuerier<T> {
    pub fn new<S: Session + ?Sized>(sess: &S, sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            core: sess.core().clone(),
            driver: sess.driver(),
            query: Query::new(sql, args),
            _entity: PhantomData,
        }
    }

    fn context(self) -> (Core, Arc<dyn Driver>, QueryContext) {
        // Scalars have no model; the binder scans them directly.
        let model: Option<Arc<Model>> = self.core.registry.get::<T>().ok();
        let core = self.core.clone();
        let driver = Arc::clone(&self.driver);
        let qc = QueryContext::new(QueryKind::Raw, Arc::new(self), model);
        (core, driver, qc)
    }

    pub async fn get(self) -> OrmResult<T> {
        let (core, driver, qc) = self.context();
        session::get(&core, driver, qc).await
    }

    pub async fn get_multi(self) -> OrmResult<Vec<T>> {
        let (core, driver, qc) = self.context();
        session::get_multi(&core, driver, qc).await
    }

    pub async fn exec(self) -> OrmResult<ExecResult> {
        let (core, driver, qc) = self.context();
        session::exec(&core, driver, qc).await
    }
}

impl<T: Entity> QueryBuilder for RawQuerier<T> {
    fn build(&self) -> OrmResult<Query> {
        Ok(self.query.clone())
    }
}
