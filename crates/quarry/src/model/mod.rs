//! Entity metadata: how a struct maps to a table and its columns.
//!
//! A struct opts in through [`Entity`] (normally via `#[derive(Entity)]`),
//! which describes its fields once. The [`Registry`] turns that description
//! into an immutable [`Model`] the first time the type is referenced and
//! caches it for the registry's lifetime.
//!
//! # Example
//!
//! ```ignore
//! use quarry::Entity;
//!
//! #[derive(Entity, Default)]
//! #[orm(table = "users")]
//! struct User {
//!     id: i64,
//!     #[orm(column = "name")]
//!     user_name: String,
//! }
//! ```

mod registry;

#[cfg(test)]
mod tests;

pub use registry::Registry;

use crate::error::{OrmError, OrmResult};
use crate::value::{FieldValue, Value};
use std::any::TypeId;
use std::collections::HashMap;

/// Struct tag key overriding a field's column name.
const TAG_KEY_COLUMN: &str = "column";

/// Shape of a type handed to the registry or a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A struct with named fields; has a [`Model`].
    Struct,
    /// A single value (`i64`, `String`, `Option<T>`, ...); scanned directly.
    Scalar,
    /// A pointer-like wrapper (`Box<T>`); rejected by the registry.
    Indirect,
}

/// Reads a field at an address. Only called by the raw-memory binder.
pub(crate) type ReadFn = unsafe fn(*const u8) -> Value;
/// Writes a field at an address. Only called by the raw-memory binder.
pub(crate) type WriteFn = unsafe fn(*mut u8, Value) -> OrmResult<()>;

/// Compile-time description of one struct field, emitted by `#[derive(Entity)]`.
///
/// The offset and the typed accessors stay private to the crate; they are
/// only ever dereferenced by the raw-memory binder.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub(crate) name: &'static str,
    pub(crate) tag: &'static str,
    pub(crate) type_name: &'static str,
    pub(crate) offset: usize,
    pub(crate) sample: fn() -> Value,
    pub(crate) read: ReadFn,
    pub(crate) write: WriteFn,
}

impl FieldSchema {
    /// Describe a field of type `F` stored `offset` bytes into its struct.
    ///
    /// Only meaningful inside [`Entity::schema`], whose `unsafe impl` vouches
    /// that `offset` and `F` match a real field of the implementing type.
    pub fn new<F: FieldValue>(
        name: &'static str,
        tag: &'static str,
        type_name: &'static str,
        offset: usize,
    ) -> Self {
        Self {
            name,
            tag,
            type_name,
            offset,
            sample: F::sample,
            read: crate::valuer::read_at::<F>,
            write: crate::valuer::write_at::<F>,
        }
    }
}

/// Compile-time description of a struct, emitted by `#[derive(Entity)]`.
#[doc(hidden)]
#[derive(Debug, Clone, Default)]
pub struct StructSchema {
    pub type_name: &'static str,
    /// Custom table name; `None` or empty falls back to the derived one.
    pub table_name: Option<&'static str>,
    pub fields: Vec<FieldSchema>,
}

/// A type that can be mapped to rows.
///
/// Structs implement this through `#[derive(Entity)]`. Scalars implement it
/// with [`EntityKind::Scalar`] so a query can scan a single column into them.
///
/// # Safety
///
/// [`ValuerKind::Unsafe`](crate::ValuerKind::Unsafe) reads and writes fields
/// in place using the layout returned by [`Entity::schema`]. Every
/// [`FieldSchema`] it returns must name a field of `Self` whose type is the
/// `F` the schema was built with, at the given byte offset
/// (`core::mem::offset_of!(Self, field)`). The derive upholds this; a
/// hand-written impl must too.
///
/// A safe impl is rejected:
///
/// ```compile_fail
/// #[derive(Default)]
/// struct Hand {
///     n: u64,
/// }
///
/// impl quarry::Entity for Hand {
///     const KIND: quarry::EntityKind = quarry::EntityKind::Struct;
/// }
/// ```
///
/// and so is reaching the raw accessors:
///
/// ```compile_fail
/// let _ = quarry::valuer::raw::read_at::<String>;
/// ```
pub unsafe trait Entity: Default + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Field layout. Only meaningful for [`EntityKind::Struct`].
    fn schema() -> StructSchema {
        StructSchema::default()
    }

    /// Current value of the field at `index`.
    fn field_value(&self, _index: usize) -> Option<Value> {
        None
    }

    /// Whether the field at `index` holds its zero value.
    fn field_is_zero(&self, _index: usize) -> bool {
        false
    }

    /// Assign a field by its logical name.
    fn set_field(&mut self, name: &str, _value: Value) -> OrmResult<()> {
        Err(OrmError::unknown_field(name))
    }

    /// Assign the whole value from a single column.
    fn set_scalar(&mut self, _value: Value) -> OrmResult<()> {
        Err(OrmError::StructOnly(std::any::type_name::<Self>().to_string()))
    }
}

macro_rules! impl_scalar_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: scalars have no struct schema.
            unsafe impl Entity for $ty {
                const KIND: EntityKind = EntityKind::Scalar;

                fn set_scalar(&mut self, value: Value) -> OrmResult<()> {
                    *self = <$ty as FieldValue>::from_value(value)?;
                    Ok(())
                }
            }
        )*
    };
}

impl_scalar_entity!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    Vec<u8>,
    chrono::NaiveDateTime,
    uuid::Uuid,
    serde_json::Value,
);

// SAFETY: scalars have no struct schema.
unsafe impl<T: FieldValue> Entity for Option<T> {
    const KIND: EntityKind = EntityKind::Scalar;

    fn set_scalar(&mut self, value: Value) -> OrmResult<()> {
        *self = <Option<T> as FieldValue>::from_value(value)?;
        Ok(())
    }
}

// SAFETY: indirect types have no struct schema.
unsafe impl<T: Entity> Entity for Box<T> {
    const KIND: EntityKind = EntityKind::Indirect;
}

/// Resolved metadata for one field.
#[derive(Debug, Clone)]
pub struct Field {
    /// Logical (Rust) field name.
    pub name: &'static str,
    /// Column name in the table.
    pub column: String,
    /// Rust type of the field, as written in the struct.
    pub type_name: &'static str,
    /// Declaration order.
    pub index: usize,
    pub(crate) offset: usize,
    pub(crate) sample: fn() -> Value,
    pub(crate) read: ReadFn,
    pub(crate) write: WriteFn,
}

impl Field {
    /// Representative value of the field's type.
    pub fn sample(&self) -> Value {
        (self.sample)()
    }
}

/// Table mapping for one entity type. Immutable once cached.
#[derive(Debug, Clone)]
pub struct Model {
    pub table_name: String,
    pub fields: Vec<Field>,
    field_map: HashMap<&'static str, usize>,
    column_map: HashMap<String, usize>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Model {
    /// Parse the struct description of `T`.
    pub(crate) fn parse<T: Entity>() -> OrmResult<Self> {
        if T::KIND != EntityKind::Struct {
            return Err(OrmError::StructOnly(std::any::type_name::<T>().to_string()));
        }
        let schema = T::schema();

        let mut fields = Vec::with_capacity(schema.fields.len());
        let mut field_map = HashMap::with_capacity(schema.fields.len());
        let mut column_map = HashMap::with_capacity(schema.fields.len());
        for (index, fd) in schema.fields.iter().enumerate() {
            let tags = parse_tag(fd.tag)?;
            let column = match tags.get(TAG_KEY_COLUMN) {
                Some(col) if !col.is_empty() => (*col).to_string(),
                _ => underscore_name(fd.name),
            };
            field_map.insert(fd.name, index);
            column_map.insert(column.clone(), index);
            fields.push(Field {
                name: fd.name,
                column,
                type_name: fd.type_name,
                index,
                offset: fd.offset,
                sample: fd.sample,
                read: fd.read,
                write: fd.write,
            });
        }

        let table_name = match schema.table_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => underscore_name(schema.type_name),
        };

        Ok(Self {
            table_name,
            fields,
            field_map,
            column_map,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Look up a field by its logical name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by its column name.
    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.column_map.get(column).map(|&i| &self.fields[i])
    }

    /// Look up a field by name, failing with an unknown-field error.
    pub fn require_field(&self, name: &str) -> OrmResult<&Field> {
        self.field(name).ok_or_else(|| OrmError::unknown_field(name))
    }

    /// Number of distinct known columns.
    pub fn column_count(&self) -> usize {
        self.column_map.len()
    }

    /// Whether this model was parsed from `T`.
    pub fn describes<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn check_type<T: 'static>(&self) -> OrmResult<()> {
        if self.describes::<T>() {
            Ok(())
        } else {
            Err(OrmError::ModelMismatch {
                model: self.type_name.to_string(),
                value: std::any::type_name::<T>().to_string(),
            })
        }
    }
}

/// Registration-time overrides applied to a freshly parsed [`Model`].
#[derive(Debug, Clone)]
pub enum ModelOption {
    TableName(String),
    ColumnName { field: String, column: String },
}

impl ModelOption {
    /// Override the table name.
    pub fn table_name(name: impl Into<String>) -> Self {
        Self::TableName(name.into())
    }

    /// Override the column name of a field.
    pub fn column_name(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnName {
            field: field.into(),
            column: column.into(),
        }
    }

    pub(crate) fn apply(self, model: &mut Model) -> OrmResult<()> {
        match self {
            Self::TableName(name) => model.table_name = name,
            Self::ColumnName { field, column } => {
                let index = *model
                    .field_map
                    .get(field.as_str())
                    .ok_or(OrmError::UnknownField(field))?;
                let old = std::mem::replace(&mut model.fields[index].column, column.clone());
                model.column_map.remove(&old);
                model.column_map.insert(column, index);
            }
        }
        Ok(())
    }
}

/// Parse a struct tag of the form `key=value,key=value`.
///
/// An empty tag yields an empty map. Unknown keys are kept and ignored by the
/// caller; a pair without exactly one `=` is an error.
pub(crate) fn parse_tag(tag: &str) -> OrmResult<HashMap<&str, &str>> {
    let mut res = HashMap::new();
    if tag.is_empty() {
        return Ok(res);
    }
    for pair in tag.split(',') {
        let kv: Vec<&str> = pair.split('=').collect();
        match kv.as_slice() {
            [key, value] => {
                res.insert(*key, *value);
            }
            _ => return Err(OrmError::InvalidTagContent(pair.to_string())),
        }
    }
    Ok(res)
}

/// CamelCase to snake_case, one underscore before every uppercase letter
/// except the first. `ID` becomes `i_d` and `Table1Name` becomes `table1_name`.
pub fn underscore_name(name: &str) -> String {
    let mut buf = String::with_capacity(name.len() + 4);
    for (i, ch) in name.char_indices() {
        if ch.is_uppercase() {
            if i != 0 {
                buf.push('_');
            }
            buf.extend(ch.to_lowercase());
        } else {
            buf.push(ch);
        }
    }
    buf
}
