//! Core domain logic for the kanban board.
//!
//! Columns are ordered within a board and cards within a column. The
//! `position` module owns that ordering; repositories and services sit
//! on top of it and never write positions themselves.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod position;
pub mod repo;
pub mod service;

pub use config::{ConfigError, KanbanConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardId};
pub use model::card::{Card, CardId, CardPatch, NewCard};
pub use model::column::{Column, ColumnId};
pub use model::label::{Label, LabelId};
pub use model::user::{User, UserId};
pub use model::EntityKind;
pub use position::{
    CardPositions, ColumnPositions, Compaction, Placement, PositionError, PositionResult,
    Relocation, Slot,
};
pub use repo::board_repo::{BoardRepository, SqliteBoardRepository};
pub use repo::card_repo::{CardRepository, SqliteCardRepository};
pub use repo::column_repo::{ColumnRepository, SqliteColumnRepository};
pub use repo::label_repo::{LabelRepository, SqliteLabelRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::board_service::BoardService;
pub use service::card_service::CardService;
pub use service::column_service::ColumnService;
pub use service::label_service::LabelService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
