//! Field access and row binding for entities.
//!
//! Two interchangeable strategies sit behind [`FieldReader`] / [`Valuer`]:
//!
//! - [`ValuerKind::Reflect`] goes through the entity's generated accessors,
//!   looking fields up by name.
//! - [`ValuerKind::Unsafe`] computes each field address from the struct's base
//!   address plus the cached offset and reads/writes it in place.
//!
//! The strategy is picked once (see `DbOptions::with_valuer`) and both give
//! identical results for identical inputs.

mod raw;
mod reflect;


pub(crate) use raw::{read_at, write_at};
pub use raw::{UnsafeReader, UnsafeValue};
pub use reflect::{ReflectReader, ReflectValue};

use crate::driver::Rows;
use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, EntityKind, Model};
use crate::value::Value;

/// Read access to the fields of one entity value.
pub trait FieldReader {
    /// Current value of the field with the given logical name.
    fn field(&self, name: &str) -> OrmResult<Value>;
}

/// Read/write access to one entity value.
pub trait Valuer: FieldReader {
    /// Bind the current row of `rows` into the value, column by column.
    fn set_columns(&mut self, rows: &Rows) -> OrmResult<()>;
}

/// Binder strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValuerKind {
    /// Name-based access through generated accessors (default).
    #[default]
    Reflect,
    /// Offset-based access through the cached field layout.
    Unsafe,
}

impl ValuerKind {
    /// Read-only handle over `val`, which must be the type `model` was parsed from.
    pub fn reader<'a, T: Entity>(
        self,
        val: &'a T,
        model: &'a Model,
    ) -> OrmResult<Box<dyn FieldReader + 'a>> {
        model.check_type::<T>()?;
        Ok(match self {
            ValuerKind::Reflect => Box::new(ReflectReader::new(val, model)),
            ValuerKind::Unsafe => Box::new(UnsafeReader::new(val, model)),
        })
    }

    /// Read/write handle over `val`, which must be the type `model` was parsed from.
    pub fn valuer<'a, T: Entity>(
        self,
        val: &'a mut T,
        model: &'a Model,
    ) -> OrmResult<Box<dyn Valuer + 'a>> {
        model.check_type::<T>()?;
        Ok(match self {
            ValuerKind::Reflect => Box::new(ReflectValue::new(val, model)),
            ValuerKind::Unsafe => Box::new(UnsafeValue::new(val, model)),
        })
    }

    /// Bind the current row into `dest`.
    ///
    /// Struct entities go through the selected strategy and need a model;
    /// scalar destinations take the single returned column directly.
    pub fn scan<T: Entity>(self, dest: &mut T, model: Option<&Model>, rows: &Rows) -> OrmResult<()> {
        match (T::KIND, model) {
            (EntityKind::Struct, Some(model)) => self.valuer(dest, model)?.set_columns(rows),
            (EntityKind::Scalar, _) => scan_scalar(dest, rows),
            _ => Err(OrmError::StructOnly(std::any::type_name::<T>().to_string())),
        }
    }
}

fn scan_scalar<T: Entity>(dest: &mut T, rows: &Rows) -> OrmResult<()> {
    if rows.columns().len() > 1 {
        return Err(OrmError::TooManyReturnedColumns);
    }
    let column = rows.columns().first().map(String::as_str).unwrap_or_default();
    let value = rows.current()?.first().cloned().unwrap_or(Value::Null);
    dest.set_scalar(value).map_err(|e| e.with_column(column))
}

/// Map each returned column to its field index before anything is written.
pub(crate) fn resolve_columns(model: &Model, rows: &Rows) -> OrmResult<Vec<usize>> {
    let columns = rows.columns();
    if columns.len() > model.column_count() {
        return Err(OrmError::TooManyReturnedColumns);
    }
    columns
        .iter()
        .map(|col| {
            model
                .field_by_column(col)
                .map(|fd| fd.index)
                .ok_or_else(|| OrmError::unknown_column(col.as_str()))
        })
        .collect()
}
