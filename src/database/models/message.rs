use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A chat message. Exactly one of `room_id` / `receiver_id` is set; the
/// `messages_single_target` check constraint holds the database to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub room_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn target(&self) -> Option<MessageTarget> {
        match (self.room_id, self.receiver_id) {
            (Some(room_id), None) => Some(MessageTarget::Room(room_id)),
            (None, Some(receiver_id)) => Some(MessageTarget::Direct(receiver_id)),
            _ => None,
        }
    }

    /// Sender and receiver of a direct message may read it; room messages are readable by anyone.
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        match self.target() {
            Some(MessageTarget::Room(_)) => true,
            Some(MessageTarget::Direct(receiver_id)) => self.sender_id == user_id || receiver_id == user_id,
            None => self.sender_id == user_id,
        }
    }
}

/// Where a message is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Room(i64),
    Direct(i64),
}

impl MessageTarget {
    pub fn room_id(&self) -> Option<i64> {
        match self {
            MessageTarget::Room(id) => Some(*id),
            MessageTarget::Direct(_) => None,
        }
    }

    pub fn receiver_id(&self) -> Option<i64> {
        match self {
            MessageTarget::Room(_) => None,
            MessageTarget::Direct(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub target: MessageTarget,
    pub content: String,
}
