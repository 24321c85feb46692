//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQLite query details from service orchestration.
//! - Route every ordering side effect through the position engine.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Position`) in
//!   addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.
//! - No repository writes `position` or a parent id directly.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::EntityKind;
use crate::position::{LoggedFailure, PositionError};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

pub mod board_repo;
pub mod card_repo;
pub mod column_repo;
pub mod label_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for kanban persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error("{kind} already exists: {key}")]
    Duplicate { kind: EntityKind, key: String },
    #[error(transparent)]
    Position(#[from] PositionError),
    /// Label and card live on different boards.
    #[error("label {label} belongs to board {label_board}, card is on board {card_board}")]
    LabelBoardMismatch {
        label: Uuid,
        label_board: Uuid,
        card_board: Uuid,
    },
    /// A card carrying labels was asked to leave their board.
    #[error("card {card} carries labels of board {from_board}; cannot move to board {to_board}")]
    LabeledCardLeavesBoard {
        card: Uuid,
        from_board: Uuid,
        to_board: Uuid,
    },
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl LoggedFailure for RepoError {
    fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::NotFound { .. } => "not_found",
            Self::Duplicate { .. } => "duplicate",
            Self::Position(err) => err.code(),
            Self::LabelBoardMismatch { .. } => "label_board_mismatch",
            Self::LabeledCardLeavesBoard { .. } => "labeled_card_leaves_board",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_required_table",
            Self::InvalidData(_) => "invalid_data",
        }
    }

    fn is_fault(&self) -> bool {
        match self {
            Self::Position(err) => err.is_fault(),
            Self::NotFound { .. }
            | Self::Duplicate { .. }
            | Self::LabelBoardMismatch { .. }
            | Self::LabeledCardLeavesBoard { .. } => false,
            _ => true,
        }
    }
}

/// Runs `body` in one write-locked transaction.
///
/// Reads made inside `body` cannot be invalidated by another writer before
/// commit. Lock contention surfaces as `PositionError::TransactionConflict`.
pub(crate) fn with_write_tx<T>(
    conn: &Connection,
    body: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(PositionError::from)?;
    let value = body(&tx)?;
    tx.commit().map_err(PositionError::from)?;
    Ok(value)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

/// Returns whether a living row with `id` exists in `table`.
pub(crate) fn is_alive(
    conn: &Connection,
    table: &'static str,
    id_column: &'static str,
    id: Uuid,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(
                SELECT 1
                FROM {table}
                WHERE {id_column} = ?1
                  AND is_deleted = 0
            );"
        ),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Resolves the board owning a living column on a living board.
pub(crate) fn board_of_column(conn: &Connection, column_uuid: Uuid) -> RepoResult<Option<Uuid>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT col.board_uuid
             FROM board_columns col
             INNER JOIN boards b ON b.board_uuid = col.board_uuid
             WHERE col.column_uuid = ?1
               AND col.is_deleted = 0
               AND b.is_deleted = 0;",
            [column_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|text| parse_uuid(&text, "board_columns.board_uuid"))
        .transpose()
}

/// Resolves the board owning a living card.
///
/// A card under a deleted column or board resolves to `None`.
pub(crate) fn board_of_card(conn: &Connection, card_uuid: Uuid) -> RepoResult<Option<Uuid>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT col.board_uuid
             FROM cards c
             INNER JOIN board_columns col ON col.column_uuid = c.column_uuid
             INNER JOIN boards b ON b.board_uuid = col.board_uuid
             WHERE c.card_uuid = ?1
               AND c.is_deleted = 0
               AND col.is_deleted = 0
               AND b.is_deleted = 0;",
            [card_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|text| parse_uuid(&text, "board_columns.board_uuid"))
        .transpose()
}

/// Verifies the connection is migrated and carries the given tables.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
