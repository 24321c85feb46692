//! Orderable entity families.
//!
//! A family binds the generic engine to one `(child table, parent table)`
//! pair. Only the INSERT differs between families; every shift, count and
//! lookup is shared SQL driven by the constants below.

use crate::model::user::UserId;
use crate::model::EntityKind;
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Table layout and insert behavior of one ordered child collection.
pub trait OrderedFamily {
    /// Kind reported for missing children.
    const CHILD: EntityKind;
    /// Kind reported for missing parents.
    const PARENT: EntityKind;
    /// Child table holding `position` and `is_deleted`.
    const TABLE: &'static str;
    /// Primary key column of the child table.
    const ID_COLUMN: &'static str;
    /// Foreign key column pointing at the parent.
    const PARENT_COLUMN: &'static str;
    const PARENT_TABLE: &'static str;
    const PARENT_ID_COLUMN: &'static str;

    /// Family-specific attributes written on append.
    type Attrs;

    /// Inserts one living child row at `position`.
    fn insert(
        conn: &Connection,
        child_id: Uuid,
        parent_id: Uuid,
        position: i64,
        attrs: &Self::Attrs,
    ) -> rusqlite::Result<()>;
}

/// Columns ordered within a board.
#[derive(Debug, Clone, Copy)]
pub enum ColumnsInBoard {}

/// Append attributes for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAttrs {
    pub title: String,
}

impl OrderedFamily for ColumnsInBoard {
    const CHILD: EntityKind = EntityKind::Column;
    const PARENT: EntityKind = EntityKind::Board;
    const TABLE: &'static str = "board_columns";
    const ID_COLUMN: &'static str = "column_uuid";
    const PARENT_COLUMN: &'static str = "board_uuid";
    const PARENT_TABLE: &'static str = "boards";
    const PARENT_ID_COLUMN: &'static str = "board_uuid";

    type Attrs = ColumnAttrs;

    fn insert(
        conn: &Connection,
        child_id: Uuid,
        parent_id: Uuid,
        position: i64,
        attrs: &Self::Attrs,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO board_columns (
                column_uuid,
                board_uuid,
                title,
                position,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                child_id.to_string(),
                parent_id.to_string(),
                attrs.title,
                position
            ],
        )?;
        Ok(())
    }
}

/// Cards ordered within a column.
#[derive(Debug, Clone, Copy)]
pub enum CardsInColumn {}

/// Append attributes for a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardAttrs {
    pub title: String,
    pub description: String,
    pub assigned_to: Option<UserId>,
    pub due_at: Option<i64>,
}

impl OrderedFamily for CardsInColumn {
    const CHILD: EntityKind = EntityKind::Card;
    const PARENT: EntityKind = EntityKind::Column;
    const TABLE: &'static str = "cards";
    const ID_COLUMN: &'static str = "card_uuid";
    const PARENT_COLUMN: &'static str = "column_uuid";
    const PARENT_TABLE: &'static str = "board_columns";
    const PARENT_ID_COLUMN: &'static str = "column_uuid";

    type Attrs = CardAttrs;

    fn insert(
        conn: &Connection,
        child_id: Uuid,
        parent_id: Uuid,
        position: i64,
        attrs: &Self::Attrs,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO cards (
                card_uuid,
                column_uuid,
                title,
                description,
                position,
                assigned_to,
                due_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0);",
            params![
                child_id.to_string(),
                parent_id.to_string(),
                attrs.title,
                attrs.description,
                position,
                attrs.assigned_to.map(|value| value.to_string()),
                attrs.due_at,
            ],
        )?;
        Ok(())
    }
}
