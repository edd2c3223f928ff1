pub mod auth;
pub mod response;
pub mod trace;

pub use auth::jwt_auth_middleware;
pub use response::{ApiResponse, ApiResult};
