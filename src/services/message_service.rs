use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::database::{
    Message, MessageFilter, MessageRepository, MessageTarget, NewMessage, RoomRepository, UserRepository,
};

use super::ServiceError;

pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    rooms: Arc<dyn RoomRepository>,
    users: Arc<dyn UserRepository>,
}

fn message_not_found() -> ServiceError {
    ServiceError::NotFound("Message not found".to_string())
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        rooms: Arc<dyn RoomRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { messages, rooms, users }
    }

    pub async fn create(&self, user: &AuthUser, target: MessageTarget, content: &str) -> Result<Message, ServiceError> {
        self.ensure_target_exists(target).await?;

        let message = self
            .messages
            .create(NewMessage {
                sender_id: user.user_id,
                target,
                content: content.to_string(),
            })
            .await?;
        info!(message_id = message.id, sender_id = user.user_id, "Message created");
        Ok(message)
    }

    pub async fn update(&self, user: &AuthUser, id: i64, content: &str) -> Result<(), ServiceError> {
        if self.messages.update(id, user.user_id, content).await? {
            return Ok(());
        }
        Err(self.explain_miss(user, id, "update").await)
    }

    pub async fn delete(&self, user: &AuthUser, id: i64) -> Result<(), ServiceError> {
        if self.messages.delete(id, user.user_id).await? {
            info!(message_id = id, sender_id = user.user_id, "Message deleted");
            return Ok(());
        }
        Err(self.explain_miss(user, id, "delete").await)
    }

    /// Messages the caller may not read are reported as missing.
    pub async fn get(&self, user: &AuthUser, id: i64) -> Result<Message, ServiceError> {
        match self.messages.find_by_id(id).await? {
            Some(message) if message.is_visible_to(user.user_id) => Ok(message),
            _ => Err(message_not_found()),
        }
    }

    /// `Room` lists a room's messages; `Direct(peer)` lists the caller's conversation with `peer`.
    pub async fn list(&self, user: &AuthUser, scope: MessageTarget) -> Result<Vec<Message>, ServiceError> {
        self.ensure_target_exists(scope).await?;
        let filter = match scope {
            MessageTarget::Room(room_id) => MessageFilter::Room(room_id),
            MessageTarget::Direct(peer_id) => MessageFilter::Conversation {
                user_id: user.user_id,
                peer_id,
            },
        };
        Ok(self.messages.list(filter).await?)
    }

    async fn ensure_target_exists(&self, target: MessageTarget) -> Result<(), ServiceError> {
        match target {
            MessageTarget::Room(room_id) => {
                if self.rooms.find_by_id(room_id).await?.is_none() {
                    return Err(ServiceError::NotFound("Room not found".to_string()));
                }
            }
            MessageTarget::Direct(receiver_id) => {
                if self.users.find_by_id(receiver_id).await?.is_none() {
                    return Err(ServiceError::NotFound("Receiver not found".to_string()));
                }
            }
        }
        Ok(())
    }

    async fn explain_miss(&self, user: &AuthUser, id: i64, action: &str) -> ServiceError {
        match self.messages.find_by_id(id).await {
            Ok(Some(message)) if message.is_visible_to(user.user_id) => {
                warn!(message_id = id, user_id = user.user_id, action, "Message change refused: not the sender");
                ServiceError::Forbidden("You are not the sender of this message".to_string())
            }
            Ok(_) => message_not_found(),
            Err(e) => e.into(),
        }
    }
}
