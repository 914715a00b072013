use super::{Builder, Query, QueryBuilder};
use crate::driver::{Driver, ExecResult};
use crate::error::OrmResult;
use crate::middleware::{QueryContext, QueryKind};
use crate::model::Entity;
use crate::session::{self, Core, Session};
use std::marker::PhantomData;
use std::sync::Arc;

/// `CREATE TABLE IF NOT EXISTS` for an entity, typed by the dialect.
///
/// Meant for tests and quick setups; there is no key, index or migration
/// support.
pub struct Creator<T> {
    core: Core,
    driver: Arc<dyn Driver>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Creator<T> {
    pub fn new<S: Session + ?Sized>(sess: &S) -> Self {
        Self {
            core: sess.core().clone(),
            driver: sess.driver(),
            _entity: PhantomData,
        }
    }

    pub async fn exec(self) -> OrmResult<ExecResult> {
        let model = self.core.registry.get::<T>()?;
        let core = self.core.clone();
        let driver = Arc::clone(&self.driver);
        let qc = QueryContext::new(QueryKind::Raw, Arc::new(self), Some(model));
        session::exec(&core, driver, qc).await
    }
}

impl<T: Entity> QueryBuilder for Creator<T> {
    fn build(&self) -> OrmResult<Query> {
        let model = self.core.registry.get::<T>()?;
        let mut b = Builder::new(&self.core, Arc::clone(&model));
        b.write_str("CREATE TABLE IF NOT EXISTS ");
        b.quote(&model.table_name);
        b.write_str(" (");
        for (i, fd) in model.fields.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            b.quote(&fd.column);
            b.write_char(' ');
            b.write_str(self.core.dialect.column_type_of(&fd.sample())?);
        }
        b.write_char(')');
        Ok(b.finish())
    }
}
