//! Label use-case service.
//!
//! Labels belong to one board and may only be attached to cards on
//! that same board.

use crate::model::board::BoardId;
use crate::model::card::CardId;
use crate::model::label::{Label, LabelId};
use crate::model::EntityKind;
use crate::repo::label_repo::LabelRepository;
use crate::service::{normalize_required, ServiceError, ServiceResult};
use once_cell::sync::Lazy;
use regex::Regex;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

/// Label service facade.
pub struct LabelService<R: LabelRepository> {
    repo: R,
}

impl<R: LabelRepository> LabelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a label on a board. Color must be `#RRGGBB`.
    pub fn create_label(&self, board: BoardId, name: &str, color: &str) -> ServiceResult<Label> {
        let name = normalize_required("name", name)?;
        let color = normalize_color(color)?;
        self.ensure_board(board)?;
        Ok(self.repo.create_label(board, &name, &color)?)
    }

    pub fn list_labels(&self, board: BoardId) -> ServiceResult<Vec<Label>> {
        self.ensure_board(board)?;
        Ok(self.repo.list_labels(board)?)
    }

    /// Attaches a label to a card on the same board. Repeating is a no-op.
    /// The repository re-checks both boards inside its write transaction.
    pub fn attach_label(&self, card: CardId, label: LabelId) -> ServiceResult<()> {
        let card_board = self.card_board(card)?;
        let label = self.label(label)?;
        if label.board_uuid != card_board {
            return Err(ServiceError::LabelBoardMismatch {
                label: label.label_uuid,
                label_board: label.board_uuid,
                card_board,
            });
        }
        Ok(self.repo.attach_label(card, label.label_uuid)?)
    }

    /// Detaches a label; returns whether it was attached.
    pub fn detach_label(&self, card: CardId, label: LabelId) -> ServiceResult<bool> {
        self.card_board(card)?;
        self.label(label)?;
        Ok(self.repo.detach_label(card, label)?)
    }

    pub fn labels_for_card(&self, card: CardId) -> ServiceResult<Vec<Label>> {
        self.card_board(card)?;
        Ok(self.repo.labels_for_card(card)?)
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

    fn card_board(&self, card: CardId) -> ServiceResult<BoardId> {
        self.repo.card_board(card)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Card,
            id: card,
        })
    }

    fn label(&self, id: LabelId) -> ServiceResult<Label> {
        self.repo.get_label(id)?.ok_or(ServiceError::NotFound {
            kind: EntityKind::Label,
            id,
        })
    }
}

fn normalize_color(value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if !COLOR_RE.is_match(trimmed) {
        return Err(ServiceError::Validation {
            field: "color",
            message: format!("`{trimmed}` is not a #RRGGBB color"),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::normalize_color;

    #[test]
    fn color_accepts_hex_triplets_only() {
        assert_eq!(normalize_color(" #a1b2c3 ").unwrap(), "#A1B2C3");
        for value in ["a1b2c3", "#abc", "#GGGGGG", "#a1b2c3d4", ""] {
            assert!(normalize_color(value).is_err(), "{value} accepted");
        }
    }
}
