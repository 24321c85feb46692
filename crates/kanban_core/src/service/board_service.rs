//! Board use-case service.
//!
//! Boards own columns but carry no position of their own. Deleting a
//! board hides it; its columns stay stored and become unreachable.

use crate::model::board::{Board, BoardId};
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::repo::board_repo::BoardRepository;
use crate::service::{normalize_required, ServiceError, ServiceResult};

/// Board service facade.
pub struct BoardService<R: BoardRepository> {
    repo: R,
}

impl<R: BoardRepository> BoardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a board owned by an existing user.
    pub fn create_board(
        &self,
        owner: UserId,
        title: &str,
        description: &str,
    ) -> ServiceResult<Board> {
        let title = normalize_required("title", title)?;
        self.ensure_user(owner)?;
        Ok(self.repo.create_board(owner, &title, description.trim())?)
    }

    pub fn get_board(&self, id: BoardId) -> ServiceResult<Board> {
        self.repo.get_board(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Board,
            id,
        })
    }

    pub fn list_boards(&self, owner: UserId) -> ServiceResult<Vec<Board>> {
        self.ensure_user(owner)?;
        Ok(self.repo.list_boards(owner)?)
    }

    /// Replaces title and description, returning the stored board.
    pub fn update_board(
        &self,
        id: BoardId,
        title: &str,
        description: &str,
    ) -> ServiceResult<Board> {
        let title = normalize_required("title", title)?;
        self.repo.update_board(id, &title, description.trim())?;
        self.get_board(id)
    }

    pub fn delete_board(&self, id: BoardId) -> ServiceResult<()> {
        Ok(self.repo.soft_delete_board(id)?)
    }

    fn ensure_user(&self, id: UserId) -> ServiceResult<()> {
        if !self.repo.user_exists(id)? {
            return Err(ServiceError::NotFound {
                kind: EntityKind::User,
                id,
            });
        }
        Ok(())
    }
}
