//! Card use-case service.
//!
//! # Responsibility
//! - Validate card input (title, assignee, due date) and hierarchy.
//! - Route every column change through the move operation.
//!
//! # Invariants
//! - A card carrying labels never leaves its board.
//! - A patch cannot change `column_uuid`; that is `move_card`'s job.
//! - After every successful call, living cards of each touched column
//!   hold positions `0..n-1`.

use crate::model::board::BoardId;
use crate::model::card::{Card, CardId, CardPatch, NewCard};
use crate::model::column::ColumnId;
use crate::model::user::UserId;
use crate::model::EntityKind;
use crate::position::{CardAttrs, Compaction, Relocation};
use crate::repo::card_repo::CardRepository;
use crate::service::{normalize_required, now_epoch_ms, ServiceError, ServiceResult};

/// Card service facade.
pub struct CardService<R: CardRepository> {
    repo: R,
}

impl<R: CardRepository> CardService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Appends a card at the end of its column.
    pub fn create_card(&self, input: NewCard) -> ServiceResult<Card> {
        let title = normalize_required("title", &input.title)?;
        self.ensure_column(input.column_uuid)?;
        if let Some(user) = input.assigned_to {
            self.ensure_user(user)?;
        }
        if let Some(due_at) = input.due_at {
            ensure_not_past(due_at)?;
        }

        let attrs = CardAttrs {
            title,
            description: input.description.trim().to_string(),
            assigned_to: input.assigned_to,
            due_at: input.due_at,
        };
        Ok(self.repo.create_card(input.column_uuid, &attrs)?)
    }

    pub fn get_card(&self, id: CardId) -> ServiceResult<Card> {
        self.repo.get_card(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Card,
            id,
        })
    }

    /// Lists cards of a column in position order.
    pub fn list_cards(&self, column: ColumnId) -> ServiceResult<Vec<Card>> {
        self.ensure_column(column)?;
        Ok(self.repo.list_cards(column)?)
    }

    /// Applies a partial update of title and description.
    pub fn update_card(&self, id: CardId, patch: CardPatch) -> ServiceResult<Card> {
        let current = self.get_card(id)?;
        if patch
            .column_uuid
            .is_some_and(|column| column != current.column_uuid)
        {
            return Err(ServiceError::ParentChangeForbidden {
                kind: EntityKind::Card,
                id,
            });
        }

        let title = match patch.title {
            Some(value) => normalize_required("title", &value)?,
            None => current.title,
        };
        let description = match patch.description {
            Some(value) => value.trim().to_string(),
            None => current.description,
        };
        self.repo.update_card(id, &title, &description)?;
        self.get_card(id)
    }

    /// Deletes a card and closes the gap in its column.
    ///
    /// A card under a deleted column or board is `NotFound`.
    pub fn delete_card(&self, id: CardId) -> ServiceResult<Compaction> {
        Ok(self.repo.delete_card(id)?)
    }

    /// Applies a full ordering of a column's cards.
    pub fn reorder_cards(&self, column: ColumnId, ordered: &[CardId]) -> ServiceResult<usize> {
        self.ensure_column(column)?;
        Ok(self.repo.reorder_cards(column, ordered)?)
    }

    /// Moves a card to `position` in `column`, possibly on another board.
    ///
    /// Moving to the slot the card already holds returns `moved == false`
    /// without opening a transaction. The labeled-card board check runs in
    /// the repository's move transaction.
    pub fn move_card(
        &self,
        id: CardId,
        column: ColumnId,
        position: i64,
    ) -> ServiceResult<Relocation> {
        let card = self.get_card(id)?;
        self.ensure_column(column)?;

        if card.column_uuid == column && card.position == position {
            return Ok(Relocation {
                from_parent: column,
                from_position: position,
                to_parent: column,
                to_position: position,
                moved: false,
            });
        }

        Ok(self.repo.move_card(id, column, position)?)
    }

    pub fn assign_card(&self, id: CardId, user: UserId) -> ServiceResult<Card> {
        self.get_card(id)?;
        self.ensure_user(user)?;
        self.repo.set_assignee(id, Some(user))?;
        self.get_card(id)
    }

    pub fn unassign_card(&self, id: CardId) -> ServiceResult<Card> {
        self.repo.set_assignee(id, None)?;
        self.get_card(id)
    }

    /// Sets or clears the due date. A due date in the past is rejected.
    pub fn set_due_date(&self, id: CardId, due_at: Option<i64>) -> ServiceResult<Card> {
        if let Some(value) = due_at {
            ensure_not_past(value)?;
        }
        self.repo.set_due_date(id, due_at)?;
        self.get_card(id)
    }

    fn ensure_column(&self, id: ColumnId) -> ServiceResult<BoardId> {
        self.repo.column_board(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Column,
            id,
        })
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

fn ensure_not_past(due_at: i64) -> ServiceResult<()> {
    if due_at < now_epoch_ms() {
        return Err(ServiceError::Validation {
            field: "due_at",
            message: format!("due date {due_at} is in the past"),
        });
    }
    Ok(())
}
