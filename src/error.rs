use thiserror::Error;

/// Errors surfaced by the access layer.
///
/// Only setup-class failures are returned as `Err` from the data entry
/// points; bind and execution failures are captured into the result object's
/// error field so callers inspect one place.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Setup error: {0}")]
    SetupError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}
