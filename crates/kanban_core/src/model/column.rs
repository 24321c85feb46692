use crate::model::board::BoardId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable column identifier.
pub type ColumnId = Uuid;

/// Column read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub column_uuid: ColumnId,
    /// Owning board. Changes only through a position-engine move.
    pub board_uuid: BoardId,
    pub title: String,
    /// Zero-based slot among the board's living columns.
    pub position: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
