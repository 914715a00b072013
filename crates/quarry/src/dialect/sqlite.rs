use super::{Dialect, build_conflict_assigns, validate_on_conflict};
use crate::error::{OrmError, OrmResult};
use crate::qb::{Builder, OnConflict};
use crate::value::Value;

/// SQLite: backtick quoting, `ON CONFLICT (..) DO UPDATE SET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite3"
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
            | Value::U32(_) => "integer",
            Value::I64(_) | Value::U64(_) => "bigint",
            Value::F32(_) | Value::F64(_) => "real",
            Value::Text(_) | Value::Uuid(_) | Value::Json(_) => "text",
            Value::Bytes(_) => "blob",
            Value::DateTime(_) => "datetime",
            Value::Null => return Err(OrmError::UnsupportedColumnType(sample.kind().to_string())),
        })
    }

    fn build_on_conflict(&self, b: &mut Builder<'_>, oc: &OnConflict) -> OrmResult<()> {
        validate_on_conflict(b, oc)?;
        b.write_str(" ON CONFLICT");
        if !oc.conflict_columns.is_empty() {
            b.write_str(" (");
            for (i, col) in oc.conflict_columns.iter().enumerate() {
                if i > 0 {
                    b.write_char(',');
                }
                let column = b.model().require_field(col)?.column.clone();
                b.quote(&column);
            }
            b.write_char(')');
        }
        b.write_str(" DO UPDATE SET ");
        build_conflict_assigns(b, oc, |b, column| {
            b.write_str("excluded.");
            b.quote(column);
        })
    }
}
