//! In-memory repositories and service builders for tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::TokenService;
use crate::config::JWT_EXPIRY_HOURS;
use crate::database::{
    DatabaseError, Message, MessageFilter, MessageRepository, NewMessage, NewRoom, NewUser, Repositories, Room,
    RoomChanges, RoomRepository, User, UserRepository,
};
use crate::services::AuthService;

pub const TEST_SECRET: &str = "test-secret";
/// Cheapest cost bcrypt accepts.
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    rooms: Vec<Room>,
    messages: Vec<Message>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One store backing all three repository traits, mirroring the Postgres semantics.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Insert a user directly, skipping hashing. Returns the new id.
    pub async fn insert_user(&self, username: &str, email: &str) -> i64 {
        let new_user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
        };
        let user = UserRepository::create(self, new_user).await.expect("insert user");
        user.id
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate("email"));
        }
        let user = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn create(&self, room: NewRoom) -> Result<Room, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let room = Room {
            id: tables.next_id(),
            name: room.name,
            is_private: room.is_private,
            created_by: Some(room.created_by),
            created_at: Utc::now(),
        };
        tables.rooms.push(room.clone());
        Ok(room)
    }

    async fn update(&self, id: i64, owner_id: i64, changes: &RoomChanges) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.lock().await;
        match tables.rooms.iter_mut().find(|r| r.id == id && r.is_owned_by(owner_id)) {
            Some(room) => {
                room.name = changes.name.clone();
                room.is_private = changes.is_private;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let before = tables.rooms.len();
        tables.rooms.retain(|r| !(r.id == id && r.is_owned_by(owner_id)));
        let deleted = tables.rooms.len() < before;
        if deleted {
            tables.messages.retain(|m| m.room_id != Some(id));
        }
        Ok(deleted)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, DatabaseError> {
        let tables = self.tables.lock().await;
        Ok(tables.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Room>, DatabaseError> {
        Ok(self.tables.lock().await.rooms.clone())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn create(&self, message: NewMessage) -> Result<Message, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let message = Message {
            id: tables.next_id(),
            sender_id: message.sender_id,
            room_id: message.target.room_id(),
            receiver_id: message.target.receiver_id(),
            content: message.content,
            created_at: now,
            updated_at: now,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn update(&self, id: i64, sender_id: i64, content: &str) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.lock().await;
        match tables.messages.iter_mut().find(|m| m.id == id && m.sender_id == sender_id) {
            Some(message) => {
                message.content = content.to_string();
                message.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64, sender_id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let before = tables.messages.len();
        tables.messages.retain(|m| !(m.id == id && m.sender_id == sender_id));
        Ok(tables.messages.len() < before)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, DatabaseError> {
        let tables = self.tables.lock().await;
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list(&self, filter: MessageFilter) -> Result<Vec<Message>, DatabaseError> {
        let tables = self.tables.lock().await;
        let messages = tables
            .messages
            .iter()
            .filter(|m| match filter {
                MessageFilter::Room(room_id) => m.room_id == Some(room_id),
                MessageFilter::Conversation { user_id, peer_id } => {
                    (m.sender_id == user_id && m.receiver_id == Some(peer_id))
                        || (m.sender_id == peer_id && m.receiver_id == Some(user_id))
                }
            })
            .cloned()
            .collect();
        Ok(messages)
    }
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::default())
}

pub fn repositories(store: &Arc<MemoryStore>) -> Repositories {
    Repositories {
        users: store.clone(),
        rooms: store.clone(),
        messages: store.clone(),
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(TEST_SECRET, JWT_EXPIRY_HOURS).expect("test token service")
}

pub fn auth_service() -> (AuthService, Arc<MemoryStore>) {
    let store = store();
    let service = AuthService::new(store.clone(), Arc::new(token_service()), TEST_BCRYPT_COST);
    (service, store)
}
