use super::{Builder, Query, QueryBuilder, Subquery, TableRef, Union, UnionKind, table_of};
use crate::driver::Driver;
use crate::error::OrmResult;
use crate::expr::{Column, OrderBy, Predicate, Selectable};
use crate::middleware::{QueryContext, QueryKind};
use crate::model::{Entity, Model};
use crate::session::{self, Core, Session};
use crate::value::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// SELECT statement builder.
///
/// Clause order is fixed: select list, FROM, WHERE, GROUP BY, HAVING,
/// ORDER BY, LIMIT, OFFSET. Unqualified columns resolve against the model of
/// the FROM table when it is a plain [`Table`](super::Table), else against `T`.
pub struct Selector<T> {
    core: Core,
    driver: Arc<dyn Driver>,
    table: Option<TableRef>,
    columns: Vec<Selectable>,
    where_: Vec<Predicate>,
    group_by: Vec<Column>,
    having: Vec<Predicate>,
    order_by: Vec<OrderBy>,
    limit: i64,
    offset: i64,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Selector<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            driver: Arc::clone(&self.driver),
            table: self.table.clone(),
            columns: self.columns.clone(),
            where_: self.where_.clone(),
            group_by: self.group_by.clone(),
            having: self.having.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Selector<T> {
    pub fn new<S: Session + ?Sized>(sess: &S) -> Self {
        Self {
            core: sess.core().clone(),
            driver: sess.driver(),
            table: None,
            columns: Vec::new(),
            where_: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
            _entity: PhantomData,
        }
    }

    /// Select list; empty selects `*`.
    pub fn select<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selectable>,
    {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// FROM target; defaults to the table of `T`.
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// WHERE predicates, AND-ed together. Select aliases are not visible here.
    pub fn where_(mut self, ps: impl IntoIterator<Item = Predicate>) -> Self {
        self.where_ = ps.into_iter().collect();
        self
    }

    pub fn group_by(mut self, cols: impl IntoIterator<Item = Column>) -> Self {
        self.group_by = cols.into_iter().collect();
        self
    }

    /// HAVING predicates, AND-ed together. Columns may name select aliases.
    pub fn having(mut self, ps: impl IntoIterator<Item = Predicate>) -> Self {
        self.having = ps.into_iter().collect();
        self
    }

    pub fn order_by(mut self, obs: impl IntoIterator<Item = OrderBy>) -> Self {
        self.order_by = obs.into_iter().collect();
        self
    }

    /// Row limit; `0` means none.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Rows to skip; `0` means none.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Use this statement as a derived table or operand named `alias`.
    pub fn as_subquery(self, alias: impl Into<String>) -> Subquery {
        let table = self
            .table
            .clone()
            .unwrap_or_else(|| TableRef::Table(table_of::<T>()));
        let columns = self.columns.clone();
        Subquery::new(Arc::new(self), Some(table), columns, alias.into())
    }

    pub fn union(self, q: impl QueryBuilder + 'static) -> Union {
        Union::new(Arc::new(self), UnionKind::Distinct, Arc::new(q))
    }

    pub fn union_all(self, q: impl QueryBuilder + 'static) -> Union {
        Union::new(Arc::new(self), UnionKind::All, Arc::new(q))
    }

    /// Model columns resolve against.
    fn model(&self) -> OrmResult<Arc<Model>> {
        match &self.table {
            Some(TableRef::Table(t)) => t.model(&self.core.registry),
            _ => self.core.registry.get::<T>(),
        }
    }

    fn context(self) -> OrmResult<(Core, Arc<dyn Driver>, QueryContext)> {
        let model = self.model()?;
        let core = self.core.clone();
        let driver = Arc::clone(&self.driver);
        let qc = QueryContext::new(QueryKind::Select, Arc::new(self), Some(model));
        Ok((core, driver, qc))
    }

    /// Execute and bind exactly one row; no row is [`OrmError::NotFound`](crate::OrmError::NotFound).
    pub async fn get(self) -> OrmResult<T> {
        let (core, driver, qc) = self.context()?;
        session::get(&core, driver, qc).await
    }

    /// Execute and bind every row.
    pub async fn get_multi(self) -> OrmResult<Vec<T>> {
        let (core, driver, qc) = self.context()?;
        session::get_multi(&core, driver, qc).await
    }

    fn build_columns(&self, b: &mut Builder<'_>) -> OrmResult<()> {
        if self.columns.is_empty() {
            b.write_char('*');
            return Ok(());
        }
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            match col {
                Selectable::Column(c) => {
                    b.build_column(c, true)?;
                    b.build_as(&c.alias)?;
                }
                Selectable::Aggregate(a) => b.build_aggregate(a, true)?,
                Selectable::Raw(r) => {
                    b.write_str(&r.sql);
                    b.add_args(r.args.iter().cloned());
                }
            }
        }
        Ok(())
    }

    fn build_group_by(&self, b: &mut Builder<'_>) -> OrmResult<()> {
        for (i, col) in self.group_by.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            b.build_column(col, false)?;
        }
        Ok(())
    }

    fn build_order_by(&self, b: &mut Builder<'_>) -> OrmResult<()> {
        for (i, ob) in self.order_by.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            let column = b.model().require_field(&ob.column)?.column.clone();
            b.quote(&column);
            b.write_char(' ');
            b.write_str(ob.order);
        }
        Ok(())
    }
}

impl<T: Entity> QueryBuilder for Selector<T> {
    fn build(&self) -> OrmResult<Query> {
        let model = self.model()?;
        let mut b = Builder::new(&self.core, model);

        b.write_str("SELECT ");
        self.build_columns(&mut b)?;
        b.write_str(" FROM ");
        b.build_table(self.table.as_ref())?;

        if !self.where_.is_empty() {
            b.write_str(" WHERE ");
            b.build_predicates(&self.where_, false, false)?;
        }
        if !self.group_by.is_empty() {
            b.write_str(" GROUP BY ");
            self.build_group_by(&mut b)?;
        }
        if !self.having.is_empty() {
            b.write_str(" HAVING ");
            b.build_predicates(&self.having, true, false)?;
        }
        if !self.order_by.is_empty() {
            b.write_str(" ORDER BY ");
            self.build_order_by(&mut b)?;
        }
        if self.limit > 0 {
            b.write_str(" LIMIT ");
            b.push_arg(Value::I64(self.limit));
        }
        if self.offset > 0 {
            b.write_str(" OFFSET ");
            b.push_arg(Value::I64(self.offset));
        }
        Ok(b.finish())
    }

    fn source(&self) -> Option<TableRef> {
        Some(
            self.table
                .clone()
                .unwrap_or_else(|| TableRef::Table(table_of::<T>())),
        )
    }
}

impl<T> std::fmt::Debug for Selector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("entity", &std::any::type_name::<T>())
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
