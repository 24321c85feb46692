use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Board owner or card assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_uuid: UserId,
    pub email: String,
    pub display_name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}
