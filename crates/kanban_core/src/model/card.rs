//! Card domain model.
//!
//! # Invariants
//! - `column_uuid` changes only through `CardService::move_card`.
//! - `due_at` is never earlier than the moment it was set.

use crate::model::column::ColumnId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable card identifier.
pub type CardId = Uuid;

/// Card read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_uuid: CardId,
    pub column_uuid: ColumnId,
    pub title: String,
    pub description: String,
    /// Zero-based slot among the column's living cards.
    pub position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    /// Unix epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    /// Returns whether the card is past due at `now_ms`.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.due_at.is_some_and(|due| due < now_ms)
    }
}

/// Creation input for one card. Position is never caller-supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCard {
    pub column_uuid: ColumnId,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<UserId>,
    pub due_at: Option<i64>,
}

/// Partial update for the plain attributes of a card.
///
/// `column_uuid` exists only so that callers echoing a full card back are
/// caught: naming a different column is rejected, not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub column_uuid: Option<ColumnId>,
}
