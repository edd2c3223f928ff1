pub mod auth_service;
pub mod error;
pub mod message_service;
pub mod room_service;

pub use auth_service::{AuthService, LoginOutcome, Registration};
pub use error::ServiceError;
pub use message_service::MessageService;
pub use room_service::RoomService;
