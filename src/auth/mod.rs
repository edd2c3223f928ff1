pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, JwtError, TokenRejection, TokenService};

/// Authenticated principal, derived from a verified bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

impl AuthUser {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}
