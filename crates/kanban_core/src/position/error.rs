use crate::db::{sqlite_code, DbError};
use crate::model::EntityKind;
use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

/// Result type used by position engine operations.
pub type PositionResult<T> = Result<T, PositionError>;

/// Errors from position engine operations.
///
/// Every variant means the transaction was rolled back; there is no
/// partial-success state.
#[derive(Debug, Error)]
pub enum PositionError {
    /// Target child does not exist or is soft-deleted.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },
    /// Parent does not exist or is soft-deleted.
    #[error("parent {kind} not found: {id}")]
    ParentNotFound { kind: EntityKind, id: Uuid },
    /// Reorder list does not match the parent's living children exactly.
    #[error(
        "reorder set for parent {parent_id} does not match its children: {} missing, {} unexpected, {} duplicated",
        missing.len(),
        unexpected.len(),
        duplicates.len()
    )]
    InvalidSet {
        parent_id: Uuid,
        missing: Vec<Uuid>,
        unexpected: Vec<Uuid>,
        duplicates: Vec<Uuid>,
    },
    /// Target position is outside `0..=max`.
    #[error("position {position} out of range 0..={max}")]
    InvalidPosition { position: i64, max: i64 },
    /// Write lock could not be acquired in time. Safe to retry with the
    /// same inputs.
    #[error("transaction conflict: {0}")]
    TransactionConflict(#[source] rusqlite::Error),
    /// Caller interrupted the running statement.
    #[error("operation cancelled")]
    Cancelled,
    /// Persisted data cannot be converted to a valid read model.
    #[error("invalid ordering data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl PositionError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::ParentNotFound { .. } => "parent_not_found",
            Self::InvalidSet { .. } => "invalid_set",
            Self::InvalidPosition { .. } => "invalid_position",
            Self::TransactionConflict(_) => "transaction_conflict",
            Self::Cancelled => "cancelled",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db_error",
        }
    }

    /// Returns whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict(_))
    }
}

impl From<rusqlite::Error> for PositionError {
    fn from(value: rusqlite::Error) -> Self {
        match sqlite_code(&value) {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::TransactionConflict(value)
            }
            Some(ErrorCode::OperationInterrupted) => Self::Cancelled,
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}
