//! Dynamic argument and cell values.
//!
//! [`Value`] is what flows between the statement builders, the binders and the
//! driver collaborator. [`FieldValue`] converts a concrete field type to and
//! from it.

use crate::error::{OrmError, OrmResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A single SQL argument or result cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Short variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Bool(b) => Some(i128::from(b)),
            Value::I8(n) => Some(n.into()),
            Value::I16(n) => Some(n.into()),
            Value::I32(n) => Some(n.into()),
            Value::I64(n) => Some(n.into()),
            Value::U8(n) => Some(n.into()),
            Value::U16(n) => Some(n.into()),
            Value::U32(n) => Some(n.into()),
            Value::U64(n) => Some(n.into()),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(f) => Some(f.into()),
            Value::F64(f) => Some(f),
            _ => self.as_i128().map(|n| n as f64),
        }
    }
}

fn mismatch(expected: &str, found: &Value) -> OrmError {
    OrmError::decode("", format!("expected {expected}, found {}", found.kind()))
}

/// Conversion between a struct field type and [`Value`].
///
/// Implemented for the primitive integer and float types, `bool`, `String`,
/// `Vec<u8>`, `chrono::NaiveDateTime`, `uuid::Uuid`, `serde_json::Value` and
/// `Option<T>` of any of them. Decoding is lenient across integer widths so a
/// driver that only reports 64-bit integers still fills an `i8` field.
pub trait FieldValue: Sized + Send + Sync + 'static {
    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> OrmResult<Self>;

    /// Whether the field holds its type's zero value.
    fn is_zero(&self) -> bool;

    /// A representative value, used to pick a dialect column type.
    fn sample() -> Value;
}

macro_rules! impl_int_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> OrmResult<Self> {
                    let n = value
                        .as_i128()
                        .ok_or_else(|| mismatch(stringify!($ty), &value))?;
                    <$ty>::try_from(n).map_err(|_| {
                        OrmError::decode("", format!("{n} is out of range for {}", stringify!($ty)))
                    })
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn sample() -> Value {
                    Value::$variant(0)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_int_field! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl FieldValue for f32 {
    fn to_value(&self) -> Value {
        Value::F32(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| mismatch("f32", &value))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn sample() -> Value {
        Value::F32(0.0)
    }
}

impl FieldValue for f64 {
    fn to_value(&self) -> Value {
        Value::F64(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", &value))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn sample() -> Value {
        Value::F64(0.0)
    }
}

impl FieldValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        value
            .as_i128()
            .map(|n| n != 0)
            .ok_or_else(|| mismatch("bool", &value))
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn sample() -> Value {
        Value::Bool(false)
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| OrmError::decode("", e.to_string())),
            other => Err(mismatch("text", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn sample() -> Value {
        Value::Text(String::new())
    }
}

impl FieldValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn sample() -> Value {
        Value::Bytes(Vec::new())
    }
}

impl FieldValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Text(s) => DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                .ok_or_else(|| OrmError::decode("", format!("invalid datetime: {s}"))),
            other => Err(mismatch("datetime", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDateTime::default()
    }

    fn sample() -> Value {
        Value::DateTime(NaiveDateTime::default())
    }
}

impl FieldValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(s) => Uuid::parse_str(&s).map_err(|e| OrmError::decode("", e.to_string())),
            Value::Bytes(b) => Uuid::from_slice(&b).map_err(|e| OrmError::decode("", e.to_string())),
            other => Err(mismatch("uuid", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_nil()
    }

    fn sample() -> Value {
        Value::Uuid(Uuid::nil())
    }
}

impl FieldValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(s) => {
                serde_json::from_str(&s).map_err(|e| OrmError::decode("", e.to_string()))
            }
            other => Err(mismatch("json", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn sample() -> Value {
        Value::Json(serde_json::Value::Null)
    }
}

// Option<T> is the nullable wrapper: `None` is the nil value.
impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn sample() -> Value {
        T::sample()
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_decoding_across_widths() {
        assert_eq!(i8::from_value(Value::I64(18)).unwrap(), 18);
        assert_eq!(u16::from_value(Value::I32(7)).unwrap(), 7);
        assert!(i8::from_value(Value::I64(300)).is_err());
        assert!(i64::from_value(Value::Text("1".into())).is_err());
    }

    #[test]
    fn test_option_nil() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Some(3i64).to_value(), Value::I64(3));
        assert_eq!(None::<i64>.to_value(), Value::Null);
        assert!(None::<i64>.is_zero());
        assert!(!Some(0i64).is_zero());
    }

    #[test]
    fn test_datetime_from_text() {
        let dt = NaiveDateTime::from_value(Value::Text("2024-01-02 03:04:05".into())).unwrap();
        assert_eq!(dt.to_string(), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_decode_error_gets_column() {
        let err = bool::from_value(Value::Text("x".into()))
            .unwrap_err()
            .with_column("active");
        match err {
            OrmError::Decode { column, .. } => assert_eq!(column, "active"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
