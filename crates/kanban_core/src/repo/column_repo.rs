//! Column repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist board columns and expose ordered listing.
//! - Delegate append, delete, reorder and move to `ColumnPositions`.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC, column_uuid ASC`.
//! - Only living (`is_deleted=0`) columns of living boards are returned.

use crate::db::NOW_MS_SQL;
use crate::model::board::BoardId;
use crate::model::column::{Column, ColumnId};
use crate::model::EntityKind;
use crate::position::{ColumnAttrs, ColumnPositions, Compaction, Relocation};
use crate::repo::{ensure_connection_ready, is_alive, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const COLUMN_SELECT_SQL: &str = "SELECT
    col.column_uuid AS column_uuid,
    col.board_uuid AS board_uuid,
    col.title AS title,
    col.position AS position,
    col.created_at AS created_at,
    col.updated_at AS updated_at
FROM board_columns col
INNER JOIN boards b
    ON b.board_uuid = col.board_uuid
   AND b.is_deleted = 0";

/// Repository interface for column operations.
pub trait ColumnRepository {
    /// Appends a column at the end of the board.
    fn create_column(&self, board: BoardId, title: &str) -> RepoResult<Column>;
    fn get_column(&self, id: ColumnId) -> RepoResult<Option<Column>>;
    fn list_columns(&self, board: BoardId) -> RepoResult<Vec<Column>>;
    fn rename_column(&self, id: ColumnId, title: &str) -> RepoResult<()>;
    /// Soft-deletes the column and compacts its board.
    fn delete_column(&self, id: ColumnId) -> RepoResult<Compaction>;
    /// Rewrites column order of a board; `ordered` must be its full set.
    fn reorder_columns(&self, board: BoardId, ordered: &[ColumnId]) -> RepoResult<usize>;
    /// Moves a column to `position` under `board`.
    fn move_column(&self, id: ColumnId, board: BoardId, position: i64) -> RepoResult<Relocation>;
    /// Returns whether an active board with `id` exists.
    fn board_exists(&self, id: BoardId) -> RepoResult<bool>;
}

/// SQLite-backed column repository.
pub struct SqliteColumnRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteColumnRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["boards", "board_columns"])?;
        Ok(Self { conn })
    }
}

impl ColumnRepository for SqliteColumnRepository<'_> {
    fn create_column(&self, board: BoardId, title: &str) -> RepoResult<Column> {
        let placement = ColumnPositions::append(
            self.conn,
            board,
            &ColumnAttrs {
                title: title.to_string(),
            },
        )?;
        self.get_column(placement.id)?.ok_or(RepoError::NotFound {
            kind: EntityKind::Column,
            id: placement.id,
        })
    }

    fn get_column(&self, id: ColumnId) -> RepoResult<Option<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE col.column_uuid = ?1
               AND col.is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_column_row(row)?));
        }
        Ok(None)
    }

    fn list_columns(&self, board: BoardId) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE col.board_uuid = ?1
               AND col.is_deleted = 0
             ORDER BY col.position ASC, col.column_uuid ASC;"
        ))?;
        let mut rows = stmt.query([board.to_string()])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    fn rename_column(&self, id: ColumnId, title: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE board_columns
                 SET title = ?2,
                     updated_at = {NOW_MS_SQL}
                 WHERE column_uuid = ?1
                   AND is_deleted = 0;"
            ),
            params![id.to_string(), title],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Column,
                id,
            });
        }
        Ok(())
    }

    fn delete_column(&self, id: ColumnId) -> RepoResult<Compaction> {
        Ok(ColumnPositions::delete_and_compact(self.conn, id)?)
    }

    fn reorder_columns(&self, board: BoardId, ordered: &[ColumnId]) -> RepoResult<usize> {
        Ok(ColumnPositions::reorder(self.conn, board, ordered)?)
    }

    fn move_column(&self, id: ColumnId, board: BoardId, position: i64) -> RepoResult<Relocation> {
        Ok(ColumnPositions::move_to(self.conn, id, board, position)?)
    }

    fn board_exists(&self, id: BoardId) -> RepoResult<bool> {
        is_alive(self.conn, "boards", "board_uuid", id)
    }
}

fn parse_column_row(row: &Row<'_>) -> RepoResult<Column> {
    let column_uuid_text: String = row.get("column_uuid")?;
    let board_uuid_text: String = row.get("board_uuid")?;
    let position: i64 = row.get("position")?;
    if position < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative position `{position}` in board_columns.position"
        )));
    }
    Ok(Column {
        column_uuid: parse_uuid(&column_uuid_text, "board_columns.column_uuid")?,
        board_uuid: parse_uuid(&board_uuid_text, "board_columns.board_uuid")?,
        title: row.get("title")?,
        position,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
