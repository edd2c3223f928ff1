// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, account creation, read-only room browsing and health.

pub mod auth;
pub mod health;
pub mod rooms;

pub use auth::{login, register};
pub use health::healthz;
pub use rooms::{room_get, room_list};
