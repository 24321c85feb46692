use crate::model::board::BoardId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LabelId = Uuid;

/// Board-scoped label. Only cards on the same board may carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub label_uuid: LabelId,
    pub board_uuid: BoardId,
    pub name: String,
    /// `#RRGGBB` hex color.
    pub color: String,
}
