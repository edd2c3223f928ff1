// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer JWT, see middleware::jwt_auth_middleware)

pub mod protected;
pub mod public;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::ApiError;

/// Parse a numeric path id, answering 400 with `message` otherwise.
pub(crate) fn parse_id(raw: &str, message: &'static str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::bad_request(message))
}

/// Parse an optional numeric query value; blank counts as absent.
pub(crate) fn parse_optional_id(raw: Option<&str>, message: &'static str) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(value, message).map(Some),
    }
}

/// Single path segment parsed as an id before any body extractor runs, so a
/// bad id wins over a bad body.
async fn path_id<S: Send + Sync>(parts: &mut Parts, state: &S, message: &'static str) -> Result<i64, ApiError> {
    let Path(raw) = Path::<String>::from_request_parts(parts, state)
        .await
        .map_err(|_| ApiError::bad_request(message))?;
    parse_id(&raw, message)
}

/// `:id` of the room routes.
#[derive(Debug, Clone, Copy)]
pub struct RoomId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for RoomId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state, "Invalid room id").await.map(RoomId)
    }
}

/// `:id` of the message routes.
#[derive(Debug, Clone, Copy)]
pub struct MessageId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for MessageId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state, "Invalid message id").await.map(MessageId)
    }
}
