//! Error types for quarry

use thiserror::Error;

/// Result type alias for quarry operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for model parsing, SQL generation and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Only plain struct entities can be registered (e.g. `User`, not `Box<User>` or `i64`)
    #[error("only single-level struct entities are supported, got `{0}`")]
    StructOnly(String),

    /// A null address or missing input was handed to the registry or a binder
    #[error("nil input is not supported")]
    NilInput,

    /// A struct tag pair has no `=value` part
    #[error("invalid tag content: {0}")]
    InvalidTagContent(String),

    /// A logical field name has no match in the model
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A result-set column has no match in the model's column map
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The same alias was introduced twice in one statement
    #[error("duplicate alias: {0}")]
    DuplicateAlias(String),

    /// An expression node cannot be rendered in this position
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A node cannot be used as an assignment target
    #[error("unsupported assignable: {0}")]
    UnsupportedAssignable(String),

    /// A node cannot be used in a SELECT list
    #[error("unsupported selectable: {0}")]
    UnsupportedSelectable(String),

    /// INSERT was built without any value rows
    #[error("insert requires at least one row")]
    InsertZeroRow,

    /// UPDATE was built without any assignment
    #[error("update requires at least one column")]
    NoUpdatedColumns,

    /// The row cursor reported more columns than the model declares
    #[error("too many returned columns")]
    TooManyReturnedColumns,

    /// Row not found
    #[error("not found: {0}")]
    NotFound(String),

    /// A value handle was built against a model of a different type
    #[error("model mismatch: model describes `{model}`, value is `{value}`")]
    ModelMismatch { model: String, value: String },

    /// No dialect is registered for the driver name
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// The dialect cannot map this sample value to a column type
    #[error("unsupported column type: {0}")]
    UnsupportedColumnType(String),

    /// Row decode/mapping error
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Driver collaborator failure
    #[error("driver error: {0}")]
    Driver(String),

    /// Transaction already committed or rolled back
    #[error("transaction has already been committed or rolled back")]
    TxDone,

    /// The transactional callback panicked
    #[error("transaction callback panicked: {0}")]
    Panicked(String),

    /// Rolling back a failed transaction also failed
    #[error("{source} (rollback failed: {rollback}, panicked: {panicked})")]
    RollbackFailed {
        source: Box<OrmError>,
        rollback: Box<OrmError>,
        panicked: bool,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create an unknown field error
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField(name.into())
    }

    /// Create an unknown column error
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn(name.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Combine a transaction failure with the error raised by its rollback.
    pub fn rollback_failed(source: OrmError, rollback: OrmError, panicked: bool) -> Self {
        Self::RollbackFailed {
            source: Box::new(source),
            rollback: Box::new(rollback),
            panicked,
        }
    }

    /// Attach a column name to a decode error raised without one.
    pub fn with_column(self, column: &str) -> Self {
        match self {
            Self::Decode { column: c, message } if c.is_empty() => Self::Decode {
                column: column.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an unknown field error
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField(_))
    }

    /// Check if the transaction was already finished
    pub fn is_tx_done(&self) -> bool {
        matches!(self, Self::TxDone)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Driver(err.to_string())
    }
}

#[cfg(feature = "prometheus")]
impl From<prometheus::Error> for OrmError {
    fn from(err: prometheus::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<tokio::task::JoinError> for OrmError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Driver(err.to_string())
    }
}
