use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::database::{NewRoom, Room, RoomChanges, RoomRepository};

use super::ServiceError;

pub struct RoomService {
    rooms: Arc<dyn RoomRepository>,
}

impl RoomService {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    pub async fn create(&self, user: &AuthUser, name: &str, is_private: bool) -> Result<Room, ServiceError> {
        let room = self
            .rooms
            .create(NewRoom {
                name: name.trim().to_string(),
                is_private,
                created_by: user.user_id,
            })
            .await?;
        info!(room_id = room.id, user_id = user.user_id, "Room created");
        Ok(room)
    }

    pub async fn update(&self, user: &AuthUser, id: i64, changes: RoomChanges) -> Result<(), ServiceError> {
        let changes = RoomChanges {
            name: changes.name.trim().to_string(),
            ..changes
        };
        if self.rooms.update(id, user.user_id, &changes).await? {
            return Ok(());
        }
        Err(self.explain_miss(user, id, "update").await)
    }

    pub async fn delete(&self, user: &AuthUser, id: i64) -> Result<(), ServiceError> {
        if self.rooms.delete(id, user.user_id).await? {
            info!(room_id = id, user_id = user.user_id, "Room deleted");
            return Ok(());
        }
        Err(self.explain_miss(user, id, "delete").await)
    }

    pub async fn get(&self, id: i64) -> Result<Room, ServiceError> {
        self.rooms
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Room not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Room>, ServiceError> {
        Ok(self.rooms.list().await?)
    }

    /// The owner-scoped statement touched nothing: tell a missing room apart from someone else's.
    async fn explain_miss(&self, user: &AuthUser, id: i64, action: &str) -> ServiceError {
        match self.rooms.find_by_id(id).await {
            Ok(None) => ServiceError::NotFound("Room not found".to_string()),
            Ok(Some(_)) => {
                warn!(room_id = id, user_id = user.user_id, action, "Room change refused: not the owner");
                ServiceError::Forbidden("You do not own this room".to_string())
            }
            Err(e) => e.into(),
        }
    }
}
