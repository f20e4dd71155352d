use thiserror::Error;

/// Unified error type for database operations that application code can handle.
///
/// This is a closed set: callers match on kinds instead of comparing against
/// sentinel values.
#[derive(Error, Debug)]
pub enum DbError {
    /// No matching, non-deleted row for the given identifier
    #[error("entity not found")]
    NotFound,

    /// A uniqueness rule was violated, either by a pre-write check or by a
    /// database unique constraint
    #[error("entity already exists")]
    AlreadyExists,

    /// A filter referenced a column that is not part of the table binding.
    /// This is a programmer error and fails fast at call time.
    #[error("unknown column \"{column}\" on table \"{table}\"")]
    UnknownColumn { table: &'static str, column: String },

    /// The execution context was cancelled while the operation was in flight
    #[error("operation cancelled")]
    Cancelled,

    /// Any other driver/connectivity/constraint failure, tagged with the
    /// operation that produced it
    #[error("storage operation `{operation}` failed")]
    Storage {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Build a converter from [`sqlx::Error`] that categorizes driver errors:
    /// missing rows and unique violations become their own kinds, everything
    /// else is wrapped as a storage fault without losing the original cause.
    pub(crate) fn storage(operation: impl Into<String>) -> impl FnOnce(sqlx::Error) -> DbError {
        let operation = operation.into();
        move |err| match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::AlreadyExists,
            _ => DbError::Storage { operation, source: err },
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
