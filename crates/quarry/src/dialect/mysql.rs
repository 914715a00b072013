use super::{Dialect, build_conflict_assigns, validate_on_conflict};
use crate::error::{OrmError, OrmResult};
use crate::qb::{Builder, OnConflict};
use crate::value::Value;

/// MySQL: backtick quoting, `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quoter(&self) -> char {
        '`'
    }

    fn column_type_of(&self, sample: &Value) -> OrmResult<&'static str> {
        Ok(match sample {
            Value::Bool(_) => "bool",
            Value::I8(_)
            | Value::I16(_)
            | Value::I32(_)
            | Value::U8(_)
            | Value::U16(_)
            | Value::U32(_) => "int(11)",
            Value::I64(_) | Value::U64(_) => "bigint(11)",
            Value::F32(_) | Value::F64(_) => "float(11)",
            Value::Text(_) => "longtext",
            Value::Bytes(_) => "blob",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "char(36)",
            Value::Json(_) => "json",
            Value::Null => return Err(OrmError::UnsupportedColumnType(sample.kind().to_string())),
        })
    }

    fn build_on_conflict(&self, b: &mut Builder<'_>, oc: &OnConflict) -> OrmResult<()> {
        validate_on_conflict(b, oc)?;
        b.write_str(" ON DUPLICATE KEY UPDATE ");
        build_conflict_assigns(b, oc, |b, column| {
            b.write_str("VALUES(");
            b.quote(column);
            b.write_char(')');
        })
    }
}
