//! Repository traits and their Postgres implementations.
//!
//! "No rows" is reported as `None`; every other driver error propagates.
//! Owner-scoped updates and deletes report whether a row was touched and leave
//! the interpretation of a miss to the caller.

pub mod message;
pub mod room;
pub mod user;

use sqlx::PgPool;
use std::sync::Arc;

pub use message::{MessageFilter, MessageRepository, PgMessageRepository};
pub use room::{PgRoomRepository, RoomRepository};
pub use user::{PgUserRepository, UserRepository};

/// The full set of repositories the services run against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            rooms: Arc::new(PgRoomRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool)),
        }
    }
}
