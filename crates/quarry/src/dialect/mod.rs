//! SQL dialects.
//!
//! A dialect is a stateless, process-wide strategy supplying the identifier
//! quote character, the column type of a field for `CREATE TABLE`, and the
//! upsert clause of an INSERT. Two are built in: [`MYSQL`] and [`SQLITE`].

mod mysql;
mod sqlite;


pub use mysql::MySql;
pub use sqlite::Sqlite;

use crate::error::{OrmError, OrmResult};
use crate::expr::Assignable;
use crate::qb::{Builder, OnConflict};
use crate::value::Value;
use std::fmt::Debug;

/// The MySQL dialect.
pub static MYSQL: MySql = MySql;
/// The SQLite dialect.
pub static SQLITE: Sqlite = Sqlite;

/// Dialect-specific SQL generation.
pub trait Dialect: Send + Sync + Debug {
    /// Short dialect name, e.g. `"mysql"`.
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn quoter(&self) -> char;

    /// Column type for a field whose representative value is `sample`.
    fn column_type_of(&self, sample: &Value) -> OrmResult<&'static str>;

    /// Append the upsert clause of an INSERT to `b`.
    fn build_on_conflict(&self, b: &mut Builder<'_>, oc: &OnConflict) -> OrmResult<()>;
}

/// Dialect registered for a driver name.
pub fn dialect_of(driver: &str) -> OrmResult<&'static dyn Dialect> {
    match driver {
        "mysql" => Ok(&MYSQL),
        "sqlite3" | "sqlite" => Ok(&SQLITE),
        other => Err(OrmError::UnsupportedDriver(other.to_string())),
    }
}

/// Check every column an upsert clause references before anything is written.
/// An upsert must assign at least one column.
fn validate_on_conflict(b: &Builder<'_>, oc: &OnConflict) -> OrmResult<()> {
    if oc.assigns.is_empty() {
        return Err(OrmError::NoUpdatedColumns);
    }
    for col in &oc.conflict_columns {
        b.model().require_field(col)?;
    }
    for assign in &oc.assigns {
        let name = match assign {
            Assignable::Column(c) => &c.name,
            Assignable::Assignment(a) => &a.column,
        };
        b.model().require_field(name)?;
    }
    Ok(())
}

/// Render the assignment list shared by both upsert flavors.
///
/// `bare` renders a column assigned to "the value that would have been inserted".
fn build_conflict_assigns(
    b: &mut Builder<'_>,
    oc: &OnConflict,
    bare: fn(&mut Builder<'_>, &str),
) -> OrmResult<()> {
    for (i, assign) in oc.assigns.iter().enumerate() {
        if i > 0 {
            b.write_char(',');
        }
        match assign {
            Assignable::Assignment(a) => b.build_assignment(a)?,
            Assignable::Column(c) => {
                let column = b.model().require_field(&c.name)?.column.clone();
                b.quote(&column);
                b.write_str(" = ");
                bare(b, &column);
            }
        }
    }
    Ok(())
}
