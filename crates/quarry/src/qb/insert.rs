use super::{Builder, Query, QueryBuilder};
use crate::driver::{Driver, ExecResult};
use crate::error::{OrmError, OrmResult};
use crate::expr::Assignable;
use crate::middleware::{QueryContext, QueryKind};
use crate::model::{Entity, Field};
use crate::session::{self, Core, Session};
use std::sync::Arc;

/// Upsert specification handed to the dialect.
#[derive(Debug, Clone, Default)]
pub struct OnConflict {
    pub(crate) conflict_columns: Vec<String>,
    pub(crate) assigns: Vec<Assignable>,
}

impl OnConflict {
    /// Fields forming the conflict target (SQLite only).
    pub fn conflict_columns(&self) -> &[String] {
        &self.conflict_columns
    }

    pub fn assigns(&self) -> &[Assignable] {
        &self.assigns
    }
}

/// INSERT statement builder.
pub struct Inserter<T> {
    core: Core,
    driver: Arc<dyn Driver>,
    values: Vec<T>,
    columns: Vec<String>,
    on_conflict: Option<OnConflict>,
}

impl<T: Entity> Inserter<T> {
    pub fn new<S: Session + ?Sized>(sess: &S) -> Self {
        Self {
            core: sess.core().clone(),
            driver: sess.driver(),
            values: Vec::new(),
            columns: Vec::new(),
            on_conflict: None,
        }
    }

    /// Rows to insert. At least one is required.
    pub fn values(mut self, vals: impl IntoIterator<Item = T>) -> Self {
        self.values = vals.into_iter().collect();
        self
    }

    /// Restrict the inserted fields; defaults to every field of `T`.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Start an upsert clause.
    pub fn on_conflict_key(self) -> OnConflictBuilder<T> {
        OnConflictBuilder {
            inserter: self,
            conflict_columns: Vec::new(),
        }
    }

    /// Execute the statement.
    pub async fn exec(self) -> OrmResult<ExecResult> {
        let model = self.core.registry.get::<T>()?;
        let core = self.core.clone();
        let driver = Arc::clone(&self.driver);
        let qc = QueryContext::new(QueryKind::Insert, Arc::new(self), Some(model));
        session::exec(&core, driver, qc).await
    }
}

impl<T: Entity> QueryBuilder for Inserter<T> {
    fn build(&self) -> OrmResult<Query> {
        if self.values.is_empty() {
            return Err(OrmError::InsertZeroRow);
        }
        let model = self.core.registry.get::<T>()?;
        let fields: Vec<&Field> = if self.columns.is_empty() {
            model.fields.iter().collect()
        } else {
            self.columns
                .iter()
                .map(|col| model.require_field(col))
                .collect::<OrmResult<_>>()?
        };

        let mut b = Builder::new(&self.core, Arc::clone(&model));
        b.write_str("INSERT INTO ");
        b.quote(&model.table_name);
        b.write_char('(');
        for (i, fd) in fields.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            b.quote(&fd.column);
        }
        b.write_str(") VALUES");

        for (i, val) in self.values.iter().enumerate() {
            if i > 0 {
                b.write_char(',');
            }
            let reader = self.core.valuer.reader(val, &model)?;
            b.write_char('(');
            for (j, fd) in fields.iter().enumerate() {
                if j > 0 {
                    b.write_char(',');
                }
                b.push_arg(reader.field(fd.name)?);
            }
            b.write_char(')');
        }

        if let Some(oc) = &self.on_conflict {
            self.core.dialect.build_on_conflict(&mut b, oc)?;
        }
        Ok(b.finish())
    }
}

/// Collects the upsert clause of an [`Inserter`].
pub struct OnConflictBuilder<T> {
    inserter: Inserter<T>,
    conflict_columns: Vec<String>,
}

impl<T: Entity> OnConflictBuilder<T> {
    /// Conflict target fields. MySQL ignores them.
    pub fn conflict_columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict_columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Assignments applied on conflict; a bare column takes the inserted value.
    pub fn update<I, A>(self, assigns: I) -> Inserter<T>
    where
        I: IntoIterator<Item = A>,
        A: Into<Assignable>,
    {
        let mut inserter = self.inserter;
        inserter.on_conflict = Some(OnConflict {
            conflict_columns: self.conflict_columns,
            assigns: assigns.into_iter().map(Into::into).collect(),
        });
        inserter
    }
}
