//! Board repository contracts and SQLite implementation.
//!
//! Boards are parents of the column collection but are not ordered
//! themselves; listing is by creation time.

use crate::db::NOW_MS_SQL;
use crate::model::board::{Board, BoardId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::{ensure_connection_ready, is_alive, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const BOARD_SELECT_SQL: &str = "SELECT
    board_uuid,
    owner_uuid,
    title,
    description,
    created_at,
    updated_at
FROM boards";

/// Repository interface for board operations.
pub trait BoardRepository {
    fn create_board(&self, owner: UserId, title: &str, description: &str) -> RepoResult<Board>;
    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    /// Lists living boards of one owner, oldest first.
    fn list_boards(&self, owner: UserId) -> RepoResult<Vec<Board>>;
    fn update_board(&self, id: BoardId, title: &str, description: &str) -> RepoResult<()>;
    fn soft_delete_board(&self, id: BoardId) -> RepoResult<()>;
    /// Returns whether an active user with `id` exists.
    fn user_exists(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "boards"])?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(&self, owner: UserId, title: &str, description: &str) -> RepoResult<Board> {
        let board_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO boards (board_uuid, owner_uuid, title, description, is_deleted)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                board_uuid.to_string(),
                owner.to_string(),
                title,
                description
            ],
        )?;
        self.get_board(board_uuid)?.ok_or(RepoError::NotFound {
            kind: EntityKind::Board,
            id: board_uuid,
        })
    }

    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOARD_SELECT_SQL}
             WHERE board_uuid = ?1
               AND is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_board_row(row)?));
        }
        Ok(None)
    }

    fn list_boards(&self, owner: UserId) -> RepoResult<Vec<Board>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOARD_SELECT_SQL}
             WHERE owner_uuid = ?1
               AND is_deleted = 0
             ORDER BY created_at ASC, board_uuid ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut boards = Vec::new();
        while let Some(row) = rows.next()? {
            boards.push(parse_board_row(row)?);
        }
        Ok(boards)
    }

    fn update_board(&self, id: BoardId, title: &str, description: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE boards
                 SET title = ?2,
                     description = ?3,
                     updated_at = {NOW_MS_SQL}
                 WHERE board_uuid = ?1
                   AND is_deleted = 0;"
            ),
            params![id.to_string(), title, description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Board,
                id,
            });
        }
        Ok(())
    }

    fn soft_delete_board(&self, id: BoardId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE boards
                 SET is_deleted = 1,
                     updated_at = {NOW_MS_SQL}
                 WHERE board_uuid = ?1
                   AND is_deleted = 0;"
            ),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Board,
                id,
            });
        }
        Ok(())
    }

    fn user_exists(&self, id: UserId) -> RepoResult<bool> {
        is_alive(self.conn, "users", "user_uuid", id)
    }
}

fn parse_board_row(row: &Row<'_>) -> RepoResult<Board> {
    let board_uuid_text: String = row.get("board_uuid")?;
    let owner_uuid_text: String = row.get("owner_uuid")?;
    Ok(Board {
        board_uuid: parse_uuid(&board_uuid_text, "boards.board_uuid")?,
        owner_uuid: parse_uuid(&owner_uuid_text, "boards.owner_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
