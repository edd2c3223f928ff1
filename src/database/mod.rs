pub mod manager;
pub mod models;
pub mod repository;

pub use manager::DatabaseError;
pub use models::{Message, MessageTarget, NewMessage, NewRoom, NewUser, Room, RoomChanges, User};
pub use repository::{MessageFilter, MessageRepository, Repositories, RoomRepository, UserRepository};
