//! Kanban domain model.
//!
//! # Responsibility
//! - Define read models for boards, columns, cards, labels and users.
//! - Name the entity kinds used by error reporting across layers.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - Living columns of a board, and living cards of a column, carry
//!   positions forming exactly `0..n`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod board;
pub mod card;
pub mod column;
pub mod label;
pub mod user;

/// Entity families addressed by id in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Board,
    Column,
    Card,
    Label,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Board => "board",
            Self::Column => "column",
            Self::Card => "card",
            Self::Label => "label",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
