pub mod message;
pub mod room;
pub mod user;

pub use message::{Message, MessageTarget, NewMessage};
pub use room::{NewRoom, Room, RoomChanges};
pub use user::{NewUser, User};
