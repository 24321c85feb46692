//! Label repository: board-scoped labels and their card attachments.
//!
//! An attachment is written only after the card's board and the label's
//! board are re-read and compared inside the same write transaction.

use crate::model::board::BoardId;
use crate::model::card::CardId;
use crate::model::label::{Label, LabelId};
use crate::model::EntityKind;
use crate::repo::{
    board_of_card, ensure_connection_ready, is_alive, parse_uuid, with_write_tx, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const LABEL_SELECT_SQL: &str = "SELECT
    l.label_uuid AS label_uuid,
    l.board_uuid AS board_uuid,
    l.name AS name,
    l.color AS color
FROM labels l";

pub trait LabelRepository {
    fn create_label(&self, board: BoardId, name: &str, color: &str) -> RepoResult<Label>;
    fn get_label(&self, id: LabelId) -> RepoResult<Option<Label>>;
    fn list_labels(&self, board: BoardId) -> RepoResult<Vec<Label>>;
    /// Attaches a label to a card on the same board. Attaching twice is a
    /// no-op; a label of another board fails with `LabelBoardMismatch`.
    fn attach_label(&self, card: CardId, label: LabelId) -> RepoResult<()>;
    /// Returns `false` when the label was not attached.
    fn detach_label(&self, card: CardId, label: LabelId) -> RepoResult<bool>;
    fn labels_for_card(&self, card: CardId) -> RepoResult<Vec<Label>>;
    fn board_exists(&self, id: BoardId) -> RepoResult<bool>;
    /// Board of a living card's column, if any.
    fn card_board(&self, card: CardId) -> RepoResult<Option<BoardId>>;
}

/// SQLite-backed label repository.
pub struct SqliteLabelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLabelRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["boards", "board_columns", "cards", "labels", "card_labels"],
        )?;
        Ok(Self { conn })
    }
}

impl LabelRepository for SqliteLabelRepository<'_> {
    fn create_label(&self, board: BoardId, name: &str, color: &str) -> RepoResult<Label> {
        let label_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO labels (label_uuid, board_uuid, name, color, is_deleted)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![label_uuid.to_string(), board.to_string(), name, color],
        )?;
        self.get_label(label_uuid)?.ok_or(RepoError::NotFound {
            kind: EntityKind::Label,
            id: label_uuid,
        })
    }

    fn get_label(&self, id: LabelId) -> RepoResult<Option<Label>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             WHERE l.label_uuid = ?1
               AND l.is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_label_row(row)?));
        }
        Ok(None)
    }

    fn list_labels(&self, board: BoardId) -> RepoResult<Vec<Label>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             WHERE l.board_uuid = ?1
               AND l.is_deleted = 0
             ORDER BY l.name ASC, l.label_uuid ASC;"
        ))?;
        let rows = stmt.query([board.to_string()])?;
        collect_labels(rows)
    }

    fn attach_label(&self, card: CardId, label: LabelId) -> RepoResult<()> {
        with_write_tx(self.conn, |tx| {
            let card_board = board_of_card(tx, card)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Card,
                id: card,
            })?;
            let label_board = board_of_label(tx, label)?.ok_or(RepoError::NotFound {
                kind: EntityKind::Label,
                id: label,
            })?;
            if label_board != card_board {
                return Err(RepoError::LabelBoardMismatch {
                    label,
                    label_board,
                    card_board,
                });
            }
            tx.execute(
                "INSERT OR IGNORE INTO card_labels (card_uuid, label_uuid)
                 VALUES (?1, ?2);",
                params![card.to_string(), label.to_string()],
            )?;
            Ok(())
        })
    }

    fn detach_label(&self, card: CardId, label: LabelId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM card_labels
             WHERE card_uuid = ?1
               AND label_uuid = ?2;",
            params![card.to_string(), label.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn labels_for_card(&self, card: CardId) -> RepoResult<Vec<Label>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             INNER JOIN card_labels cl ON cl.label_uuid = l.label_uuid
             WHERE cl.card_uuid = ?1
               AND l.is_deleted = 0
             ORDER BY l.name ASC, l.label_uuid ASC;"
        ))?;
        let rows = stmt.query([card.to_string()])?;
        collect_labels(rows)
    }

    fn board_exists(&self, id: BoardId) -> RepoResult<bool> {
        is_alive(self.conn, "boards", "board_uuid", id)
    }

    fn card_board(&self, card: CardId) -> RepoResult<Option<BoardId>> {
        board_of_card(self.conn, card)
    }
}

fn board_of_label(conn: &Connection, label: LabelId) -> RepoResult<Option<BoardId>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT board_uuid
             FROM labels
             WHERE label_uuid = ?1
               AND is_deleted = 0;",
            [label.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|text| parse_uuid(&text, "labels.board_uuid"))
        .transpose()
}

fn collect_labels(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Label>> {
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(parse_label_row(row)?);
    }
    Ok(labels)
}

fn parse_label_row(row: &Row<'_>) -> RepoResult<Label> {
    let label_uuid_text: String = row.get("label_uuid")?;
    let board_uuid_text: String = row.get("board_uuid")?;
    Ok(Label {
        label_uuid: parse_uuid(&label_uuid_text, "labels.label_uuid")?,
        board_uuid: parse_uuid(&board_uuid_text, "labels.board_uuid")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}
