//! Column use-case service.
//!
//! # Responsibility
//! - Validate board existence and titles before touching column order.
//! - Keep column moves inside the column's own board.
//!
//! # Invariants
//! - After every successful call, living columns of each board hold
//!   positions `0..n-1` without gaps or duplicates.

use crate::model::board::BoardId;
use crate::model::column::{Column, ColumnId};
use crate::model::EntityKind;
use crate::position::{Compaction, Relocation};
use crate::repo::column_repo::ColumnRepository;
use crate::service::{normalize_required, ServiceError, ServiceResult};

/// Column service facade.
pub struct ColumnService<R: ColumnRepository> {
    repo: R,
}

impl<R: ColumnRepository> ColumnService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Appends a new column at the end of the board.
    pub fn create_column(&self, board: BoardId, title: &str) -> ServiceResult<Column> {
        let title = normalize_required("title", title)?;
        self.ensure_board(board)?;
        Ok(self.repo.create_column(board, &title)?)
    }

    pub fn get_column(&self, id: ColumnId) -> ServiceResult<Column> {
        self.repo.get_column(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Column,
            id,
        })
    }

    /// Lists columns of a board in position order.
    pub fn list_columns(&self, board: BoardId) -> ServiceResult<Vec<Column>> {
        self.ensure_board(board)?;
        Ok(self.repo.list_columns(board)?)
    }

    pub fn rename_column(&self, id: ColumnId, title: &str) -> ServiceResult<Column> {
        let title = normalize_required("title", title)?;
        self.get_column(id)?;
        self.repo.rename_column(id, &title)?;
        self.get_column(id)
    }

    /// Deletes a column and closes the gap it leaves.
    ///
    /// Its cards stay in storage but are no longer reachable.
    pub fn delete_column(&self, id: ColumnId) -> ServiceResult<Compaction> {
        self.get_column(id)?;
        Ok(self.repo.delete_column(id)?)
    }

    /// Applies a full ordering of the board's columns.
    ///
    /// `ordered` must list every living column of the board exactly once.
    /// Returns how many columns changed position.
    pub fn reorder_columns(&self, board: BoardId, ordered: &[ColumnId]) -> ServiceResult<usize> {
        self.ensure_board(board)?;
        Ok(self.repo.reorder_columns(board, ordered)?)
    }

    /// Moves a column to `position` within its board.
    pub fn move_column(&self, id: ColumnId, position: i64) -> ServiceResult<Relocation> {
        let column = self.get_column(id)?;
        Ok(self.repo.move_column(id, column.board_uuid, position)?)
    }

    fn ensure_board(&self, id: BoardId) -> ServiceResult<()> {
        if !self.repo.board_exists(id)? {
            return Err(ServiceError::NotFound {
                kind: EntityKind::Board,
                id,
            });
        }
        Ok(())
    }
}
