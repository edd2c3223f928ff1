use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub is_private: bool,
    /// Creator; `None` once the creating account is gone.
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.created_by == Some(user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub is_private: bool,
    pub created_by: i64,
}

/// Mutable room attributes.
#[derive(Debug, Clone)]
pub struct RoomChanges {
    pub name: String,
    pub is_private: bool,
}
