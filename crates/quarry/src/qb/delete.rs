use super::{Builder, Query, QueryBuilder, Table, TableRef};
use crate::driver::{Driver, ExecResult};
use crate::error::OrmResult;
use crate::expr::Predicate;
use crate::middleware::{QueryContext, QueryKind};
use crate::model::{Entity, Model};
use crate::session::{self, Core, Session};
use std::sync::Arc;

/// DELETE statement builder.
pub struct Deleter<T> {
    core: Core,
    driver: Arc<dyn Driver>,
    table: Option<Table>,
    where_: Vec<Predicate>,
    _entity: std::marker::PhantomData<fn() -> T>,
}

impl<T: Entity> Deleter<T> {
    pub fn new<S: Session + ?Sized>(sess: &S) -> Self {
        Self {
            core: sess.core().clone(),
            driver: sess.driver(),
            table: None,
            where_: Vec::new(),
            _entity: std::marker::PhantomData,
        }
    }

    /// Delete from another entity's table.
    pub fn from(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn where_(mut self, ps: impl IntoIterator<Item = Predicate>) -> Self {
        self.where_ = ps.into_iter().collect();
        self
    }

    fn model(&self) -> OrmResult<Arc<Model>> {
        match &self.table {
            Some(t) => t.model(&self.core.registry),
            None => self.core.registry.get::<T>(),
        }
    }

    /// Execute the statement.
    pub async fn exec(self) -> OrmResult<ExecResult> {
        let model = self.model()?;
        let core = self.core.clone();
        let driver = Arc::clone(&self.driver);
        let qc = QueryContext::new(QueryKind::Delete, Arc::new(self), Some(model));
        session::exec(&core, driver, qc).await
    }
}

impl<T: Entity> QueryBuilder for Deleter<T> {
    fn build(&self) -> OrmResult<Query> {
        let model = self.model()?;
        let mut b = Builder::new(&self.core, model);
        b.write_str("DELETE FROM ");
        let table = self.table.clone().map(TableRef::Table);
        b.build_table(table.as_ref())?;
        if !self.where_.is_empty() {
            b.write_str(" WHERE ");
            b.build_predicates(&self.where_, false, false)?;
        }
        Ok(b.finish())
    }
}
