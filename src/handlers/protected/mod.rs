// handlers/protected/mod.rs - Protected handlers (bearer JWT required)
//
// Every handler here takes the `AuthUser` principal the auth middleware
// placed in the request; the services use it for ownership checks.

pub mod messages;
pub mod rooms;

pub use messages::{message_create, message_delete, message_get, message_list, message_update};
pub use rooms::{room_create, room_delete, room_update};
