use super::{Builder, Query, QueryBuilder};
use crate::driver::{Driver, ExecResult};
use crate::error::{OrmError, OrmResult};
use crate::expr::{Assignable, Predicate, assign};
use crate::middleware::{QueryContext, QueryKind};
use crate::model::Entity;
use crate::session::{self, Core, Session};
use crate::value::Value;
use std::sync::Arc;

/// UPDATE statement builder.
///
/// A bare column in [`set`](Updater::set) takes its value from the template
/// passed to [`update`](Updater::update), or from `T::default()` when no
/// template was given.
pub struct Updater<T> {
    core: Core,
    driver: Arc<dyn Driver>,
    template: Option<T>,
    assigns: Vec<Assignable>,
    where_: Vec<Predicate>,
}

impl<T: Entity> Updater<T> {
    pub fn new<S: Session + ?Sized>(sess: &S) -> Self {
        Self {
            core: sess.core().clone(),
            driver: sess.driver(),
            template: None,
            assigns: Vec::new(),
            where_: Vec::new(),
        }
    }

    /// Row bare columns read their values from.
    pub fn update(mut self, template: T) -> Self {
        self.template = Some(template);
        self
    }

    /// Assignments. At least one is required.
    pub fn set<I, A>(mut self, assigns: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Assignable>,
    {
        self.assigns = assigns.into_iter().map(Into::into).collect();
        self
    }

    pub fn where_(mut self, ps: impl IntoIterator<Item = Predicate>) -> Self {
        self.where_ = ps.into_iter().collect();
        self
    }

    /// Execute the statement.
    pub async fn exec(self) -> OrmResult<ExecResult> {
        let model = self.core.registry.get::<T>()?;
        let core = self.core.clone();
        let driver = Arc::clone(&self.driver);
        let qc = QueryContext::new(QueryKind::Update, Arc::new(self), Some(model));
        session::exec(&core, driver, qc).await
    }
}

impl<T: Entity> QueryBuilder for Updater<T> {
    fn build(&self) -> OrmResult<Query> {
        if self.assigns.is_empty() {
            return Err(OrmError::NoUpdatedColumns);
        }
        let model = self.core.registry.get::<T>()?;
        let fallback;
        let template = match &self.template {
            Some(t) => t,
            None => {
                fallback = T::default();
                &fallback
            }
        };
        let reader = self.core.valuer.reader(template, &model)?;

        let mut b = Builder::new(&self.core, Arc::clone(&model));
        b.write_str("UPDATE ");
        b.quote(&model.table_name);
        b.write_str(" SET ");
        for (i, a) in self.assigns.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            match a {
                Assignable::Assignment(a) => b.build_assignment(a)?,
                Assignable::Column(c) => {
                    let fd = model.require_field(&c.name)?;
                    b.quote(&fd.column);
                    b.write_str(" = ");
                    b.push_arg(reader.field(fd.name)?);
                }
            }
        }
        if !self.where_.is_empty() {
            b.write_str(" WHERE ");
            b.build_predicates(&self.where_, false, false)?;
        }
        Ok(b.finish())
    }
}

/// Assign every field of `entity` accepted by `filter`, in declaration order.
///
/// `filter` receives the field's logical name and current value.
pub fn assign_columns<T, F>(entity: &T, mut filter: F) -> Vec<Assignable>
where
    T: Entity,
    F: FnMut(&str, &Value) -> bool,
{
    collect_assigns(entity, |name, _, val| filter(name, val))
}

/// Assign every field that is not nil (`None`).
pub fn assign_not_nil_columns<T: Entity>(entity: &T) -> Vec<Assignable> {
    collect_assigns(entity, |_, _, val| !val.is_null())
}

/// Assign every field that does not hold its zero value.
pub fn assign_not_zero_columns<T: Entity>(entity: &T) -> Vec<Assignable> {
    collect_assigns(entity, |_, index, _| !entity.field_is_zero(index))
}

fn collect_assigns<T, F>(entity: &T, mut keep: F) -> Vec<Assignable>
where
    T: Entity,
    F: FnMut(&str, usize, &Value) -> bool,
{
    let schema = T::schema();
    let mut res = Vec::with_capacity(schema.fields.len());
    for (index, fd) in schema.fields.iter().enumerate() {
        let Some(val) = entity.field_value(index) else {
            continue;
        };
        if keep(fd.name, index, &val) {
            res.push(Assignable::Assignment(assign(fd.name, val)));
        }
    }
    res
}
