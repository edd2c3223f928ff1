use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::database::DatabaseError;

/// Business-rule failures plus the infrastructure errors services pass through.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    pub fn invalid_credentials() -> Self {
        ServiceError::Unauthorized("invalid credentials".to_string())
    }
}
