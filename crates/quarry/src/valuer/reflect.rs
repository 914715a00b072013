use super::{FieldReader, Valuer, resolve_columns};
use crate::driver::Rows;
use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, Model};
use crate::value::Value;

/// Name-based read access through the entity's generated accessors.
pub struct ReflectReader<'a, T> {
    val: &'a T,
    model: &'a Model,
}

impl<'a, T: Entity> ReflectReader<'a, T> {
    pub(crate) fn new(val: &'a T, model: &'a Model) -> Self {
        Self { val, model }
    }
}

impl<T: Entity> FieldReader for ReflectReader<'_, T> {
    fn field(&self, name: &str) -> OrmResult<Value> {
        read_field(self.val, self.model, name)
    }
}

/// Name-based read/write access through the entity's generated accessors.
pub struct ReflectValue<'a, T> {
    val: &'a mut T,
    model: &'a Model,
}

impl<'a, T: Entity> ReflectValue<'a, T> {
    pub(crate) fn new(val: &'a mut T, model: &'a Model) -> Self {
        Self { val, model }
    }
}

impl<T: Entity> FieldReader for ReflectValue<'_, T> {
    fn field(&self, name: &str) -> OrmResult<Value> {
        read_field(self.val, self.model, name)
    }
}

impl<T: Entity> Valuer for ReflectValue<'_, T> {
    fn set_columns(&mut self, rows: &Rows) -> OrmResult<()> {
        let indexes = resolve_columns(self.model, rows)?;
        let row = rows.current()?;

        // One destination per returned column, then copy each into its field by name.
        let dests: Vec<(usize, Value)> = indexes
            .into_iter()
            .zip(row.iter().cloned())
            .collect();
        for (index, value) in dests {
            let fd = &self.model.fields[index];
            self.val
                .set_field(fd.name, value)
                .map_err(|e| e.with_column(&fd.column))?;
        }
        Ok(())
    }
}

fn read_field<T: Entity>(val: &T, model: &Model, name: &str) -> OrmResult<Value> {
    let fd = model.require_field(name)?;
    val.field_value(fd.index)
        .ok_or_else(|| OrmError::unknown_field(name))
}
