use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewRoom, Room, RoomChanges};

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create(&self, room: NewRoom) -> Result<Room, DatabaseError>;
    /// Returns `false` when no room with `id` is owned by `owner_id`.
    async fn update(&self, id: i64, owner_id: i64, changes: &RoomChanges) -> Result<bool, DatabaseError>;
    /// Returns `false` when no room with `id` is owned by `owner_id`.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, DatabaseError>;
    async fn list(&self) -> Result<Vec<Room>, DatabaseError>;
}

pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn create(&self, room: NewRoom) -> Result<Room, DatabaseError> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (name, is_private, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, is_private, created_by, created_at
            "#,
        )
        .bind(&room.name)
        .bind(room.is_private)
        .bind(room.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(room)
    }

    async fn update(&self, id: i64, owner_id: i64, changes: &RoomChanges) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE rooms SET name = $1, is_private = $2 WHERE id = $3 AND created_by = $4",
        )
        .bind(&changes.name)
        .bind(changes.is_private)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, DatabaseError> {
        let room = sqlx::query_as::<_, Room>(
            "SELECT id, name, is_private, created_by, created_at FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(room)
    }

    async fn list(&self) -> Result<Vec<Room>, DatabaseError> {
        let rooms = sqlx::query_as::<_, Room>(
            "SELECT id, name, is_private, created_by, created_at FROM rooms ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }
}
