use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Message, NewMessage};

/// Which messages to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFilter {
    /// Everything posted to a room.
    Room(i64),
    /// Direct messages between two users, both directions.
    Conversation { user_id: i64, peer_id: i64 },
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: NewMessage) -> Result<Message, DatabaseError>;
    /// Returns `false` when no message with `id` was sent by `sender_id`.
    async fn update(&self, id: i64, sender_id: i64, content: &str) -> Result<bool, DatabaseError>;
    /// Returns `false` when no message with `id` was sent by `sender_id`.
    async fn delete(&self, id: i64, sender_id: i64) -> Result<bool, DatabaseError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, DatabaseError>;
    /// Oldest first.
    async fn list(&self, filter: MessageFilter) -> Result<Vec<Message>, DatabaseError>;
}

const COLUMNS: &str = "id, sender_id, room_id, receiver_id, content, created_at, updated_at";

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message, DatabaseError> {
        let sql = format!(
            "INSERT INTO messages (sender_id, room_id, receiver_id, content) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(message.sender_id)
            .bind(message.target.room_id())
            .bind(message.target.receiver_id())
            .bind(&message.content)
            .fetch_one(&self.pool)
            .await?;
        Ok(message)
    }

    async fn update(&self, id: i64, sender_id: i64, content: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE messages SET content = $1, updated_at = NOW() WHERE id = $2 AND sender_id = $3",
        )
        .bind(content)
        .bind(id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64, sender_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND sender_id = $2")
            .bind(id)
            .bind(sender_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, DatabaseError> {
        let sql = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    async fn list(&self, filter: MessageFilter) -> Result<Vec<Message>, DatabaseError> {
        let messages = match filter {
            MessageFilter::Room(room_id) => {
                let sql = format!("SELECT {COLUMNS} FROM messages WHERE room_id = $1 ORDER BY created_at ASC, id ASC");
                sqlx::query_as::<_, Message>(&sql)
                    .bind(room_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            MessageFilter::Conversation { user_id, peer_id } => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM messages \
                     WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
                     ORDER BY created_at ASC, id ASC"
                );
                sqlx::query_as::<_, Message>(&sql)
                    .bind(user_id)
                    .bind(peer_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(messages)
    }
}
