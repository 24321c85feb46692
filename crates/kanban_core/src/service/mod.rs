//! Kanban use-case services.
//!
//! # Responsibility
//! - Validate input and hierarchy (parent exists, assignee exists, label
//!   board matches card board) above the repository layer.
//! - Translate repository and position-engine failures into one
//!   caller-facing error type.
//!
//! # Invariants
//! - Services never write ordering state themselves; every positional
//!   effect goes through a repository backed by the position engine.

use crate::model::board::BoardId;
use crate::model::card::CardId;
use crate::model::label::LabelId;
use crate::model::EntityKind;
use crate::position::PositionError;
use crate::repo::RepoError;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

pub mod board_service;
pub mod card_service;
pub mod column_service;
pub mod label_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from kanban service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed field validation.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    /// Target entity, or a parent it depends on, does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error("{kind} already exists: {key}")]
    Duplicate { kind: EntityKind, key: String },
    /// Reorder list does not name the parent's children exactly once each.
    #[error(
        "reorder set for {parent_id} does not match: {} missing, {} unexpected, {} duplicated",
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
    #[error("position {position} out of range 0..={max}")]
    InvalidPosition { position: i64, max: i64 },
    /// Label and card live on different boards.
    #[error("label {label} belongs to board {label_board}, card is on board {card_board}")]
    LabelBoardMismatch {
        label: LabelId,
        label_board: BoardId,
        card_board: BoardId,
    },
    /// A labeled card cannot leave its board.
    #[error("card {card} carries labels of board {from_board}; cannot move to board {to_board}")]
    LabeledCardLeavesBoard {
        card: CardId,
        from_board: BoardId,
        to_board: BoardId,
    },
    /// Parent reference edits must go through the move operation.
    #[error("{kind} {id} cannot change its parent outside a move")]
    ParentChangeForbidden { kind: EntityKind, id: Uuid },
    /// Write lock not acquired in time; the call may be retried unchanged.
    #[error("transaction conflict: {0}")]
    TransactionConflict(#[source] rusqlite::Error),
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Repo(RepoError),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict(_))
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Duplicate { kind, key } => Self::Duplicate { kind, key },
            RepoError::Position(err) => err.into(),
            RepoError::LabelBoardMismatch {
                label,
                label_board,
                card_board,
            } => Self::LabelBoardMismatch {
                label,
                label_board,
                card_board,
            },
            RepoError::LabeledCardLeavesBoard {
                card,
                from_board,
                to_board,
            } => Self::LabeledCardLeavesBoard {
                card,
                from_board,
                to_board,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<PositionError> for ServiceError {
    fn from(value: PositionError) -> Self {
        match value {
            PositionError::NotFound { kind, id } | PositionError::ParentNotFound { kind, id } => {
                Self::NotFound { kind, id }
            }
            PositionError::InvalidSet {
                parent_id,
                missing,
                unexpected,
                duplicates,
            } => Self::InvalidSet {
                parent_id,
                missing,
                unexpected,
                duplicates,
            },
            PositionError::InvalidPosition { position, max } => {
                Self::InvalidPosition { position, max }
            }
            PositionError::TransactionConflict(err) => Self::TransactionConflict(err),
            PositionError::Cancelled => Self::Cancelled,
            other => Self::Repo(RepoError::Position(other)),
        }
    }
}

/// Trims a required text field and rejects blank values.
pub(crate) fn normalize_required(field: &'static str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
