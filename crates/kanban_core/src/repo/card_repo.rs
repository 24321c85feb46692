//! Card repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist cards and their plain attributes (title, assignee, due date).
//! - Delegate append, delete, reorder and move to `CardPositions`.
//! - Answer the cross-entity lookups card use-cases validate against.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC, card_uuid ASC`.
//! - `column_uuid` is never written outside `CardPositions::move_to`.
//! - A card is reachable only while its column and board are alive.
//! - A card carrying labels never changes board; the check and the move
//!   share one write transaction.

use crate::db::NOW_MS_SQL;
use crate::model::board::BoardId;
use crate::model::card::{Card, CardId};
use crate::model::column::ColumnId;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::position::{run, CardAttrs, CardPositions, CardsInColumn, Compaction, Relocation};
use crate::repo::{
    board_of_card, board_of_column, ensure_connection_ready, is_alive, parse_optional_uuid,
    parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const CARD_SELECT_SQL: &str = "SELECT
    c.card_uuid AS card_uuid,
    c.column_uuid AS column_uuid,
    c.title AS title,
    c.description AS description,
    c.position AS position,
    c.assigned_to AS assigned_to,
    c.due_at AS due_at,
    c.created_at AS created_at,
    c.updated_at AS updated_at
FROM cards c
INNER JOIN board_columns col
    ON col.column_uuid = c.column_uuid
   AND col.is_deleted = 0
INNER JOIN boards b
    ON b.board_uuid = col.board_uuid
   AND b.is_deleted = 0";

const LIVING_COLUMN_FILTER: &str = "column_uuid IN (
    SELECT col.column_uuid
    FROM board_columns col
    INNER JOIN boards b ON b.board_uuid = col.board_uuid
    WHERE col.is_deleted = 0
      AND b.is_deleted = 0
)";

/// Repository interface for card operations.
pub trait CardRepository {
    /// Appends a card at the end of the column.
    fn create_card(&self, column: ColumnId, attrs: &CardAttrs) -> RepoResult<Card>;
    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>>;
    fn list_cards(&self, column: ColumnId) -> RepoResult<Vec<Card>>;
    fn update_card(&self, id: CardId, title: &str, description: &str) -> RepoResult<()>;
    fn set_assignee(&self, id: CardId, user: Option<UserId>) -> RepoResult<()>;
    fn set_due_date(&self, id: CardId, due_at: Option<i64>) -> RepoResult<()>;
    /// Soft-deletes the card and compacts its column.
    fn delete_card(&self, id: CardId) -> RepoResult<Compaction>;
    fn reorder_cards(&self, column: ColumnId, ordered: &[CardId]) -> RepoResult<usize>;
    /// Moves a card to `position` in `column`.
    ///
    /// Fails with `LabeledCardLeavesBoard` when the card carries labels and
    /// `column` is on another board.
    fn move_card(&self, id: CardId, column: ColumnId, position: i64) -> RepoResult<Relocation>;
    /// Board of a living column, if any.
    fn column_board(&self, column: ColumnId) -> RepoResult<Option<BoardId>>;
    fn user_exists(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed card repository.
pub struct SqliteCardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["users", "boards", "board_columns", "cards", "labels", "card_labels"],
        )?;
        Ok(Self { conn })
    }

    fn update_one(&self, id: CardId, assignments: &str, value: &dyn rusqlite::ToSql) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE cards
                 SET {assignments},
                     updated_at = {NOW_MS_SQL}
                 WHERE card_uuid = ?1
                   AND is_deleted = 0
                   AND {LIVING_COLUMN_FILTER};"
            ),
            params![id.to_string(), value],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Card,
                id,
            });
        }
        Ok(())
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn create_card(&self, column: ColumnId, attrs: &CardAttrs) -> RepoResult<Card> {
        let placement = CardPositions::append(self.conn, column, attrs)?;
        self.get_card(placement.id)?.ok_or(RepoError::NotFound {
            kind: EntityKind::Card,
            id: placement.id,
        })
    }

    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE c.card_uuid = ?1
               AND c.is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_card_row(row)?));
        }
        Ok(None)
    }

    fn list_cards(&self, column: ColumnId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE c.column_uuid = ?1
               AND c.is_deleted = 0
             ORDER BY c.position ASC, c.card_uuid ASC;"
        ))?;
        let mut rows = stmt.query([column.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    fn update_card(&self, id: CardId, title: &str, description: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE cards
                 SET title = ?2,
                     description = ?3,
                     updated_at = {NOW_MS_SQL}
                 WHERE card_uuid = ?1
                   AND is_deleted = 0
                   AND {LIVING_COLUMN_FILTER};"
            ),
            params![id.to_string(), title, description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Card,
                id,
            });
        }
        Ok(())
    }

    fn set_assignee(&self, id: CardId, user: Option<UserId>) -> RepoResult<()> {
        self.update_one(
            id,
            "assigned_to = ?2",
            &user.map(|value| value.to_string()),
        )
    }

    fn set_due_date(&self, id: CardId, due_at: Option<i64>) -> RepoResult<()> {
        self.update_one(id, "due_at = ?2", &due_at)
    }

    fn delete_card(&self, id: CardId) -> RepoResult<Compaction> {
        run::<CardsInColumn, _, RepoError>("delete", id, self.conn, |tx| {
            if board_of_card(tx, id)?.is_none() {
                return Err(RepoError::NotFound {
                    kind: EntityKind::Card,
                    id,
                });
            }
            Ok(CardPositions::delete_and_compact_in(tx, id)?)
        })
    }

    fn reorder_cards(&self, column: ColumnId, ordered: &[CardId]) -> RepoResult<usize> {
        Ok(CardPositions::reorder(self.conn, column, ordered)?)
    }

    fn move_card(&self, id: CardId, column: ColumnId, position: i64) -> RepoResult<Relocation> {
        run::<CardsInColumn, _, RepoError>("move", id, self.conn, |tx| {
            let from_board = board_of_card(tx, id)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Card,
                id,
            })?;
            let to_board = board_of_column(tx, column)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Column,
                id: column,
            })?;
            if from_board != to_board && living_label_count(tx, id)? > 0 {
                return Err(RepoError::LabeledCardLeavesBoard {
                    card: id,
                    from_board,
                    to_board,
                });
            }
            Ok(CardPositions::move_to_in(tx, id, column, position)?)
        })
    }

    fn column_board(&self, column: ColumnId) -> RepoResult<Option<BoardId>> {
        board_of_column(self.conn, column)
    }

    fn user_exists(&self, id: UserId) -> RepoResult<bool> {
        is_alive(self.conn, "users", "user_uuid", id)
    }
}

fn living_label_count(conn: &Connection, id: CardId) -> RepoResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*)
         FROM card_labels cl
         INNER JOIN labels l ON l.label_uuid = cl.label_uuid
         WHERE cl.card_uuid = ?1
           AND l.is_deleted = 0;",
        [id.to_string()],
        |row| row.get(0),
    )?)
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let card_uuid_text: String = row.get("card_uuid")?;
    let column_uuid_text: String = row.get("column_uuid")?;
    let position: i64 = row.get("position")?;
    if position < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative position `{position}` in cards.position"
        )));
    }
    Ok(Card {
        card_uuid: parse_uuid(&card_uuid_text, "cards.card_uuid")?,
        column_uuid: parse_uuid(&column_uuid_text, "cards.column_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        position,
        assigned_to: parse_optional_uuid(row.get("assigned_to")?, "cards.assigned_to")?,
        due_at: row.get("due_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
