use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{AuthUser, TokenService};
use crate::error::ApiError;

/// JWT authentication middleware for the protected route group.
///
/// On success the principal is placed in the request extensions for handlers
/// and in the response extensions for the request logger.
pub async fn jwt_auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(ApiError::unauthorized)?;

    let user = tokens.verify(token).map_err(|rejection| {
        tracing::debug!(reason = %rejection, "Rejected bearer token");
        ApiError::unauthorized(rejection.to_string())
    })?;

    request.extensions_mut().insert(user);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers.get(AUTHORIZATION).ok_or("Missing Authorization header")?;
    let value = value.to_str().map_err(|_| "Invalid Authorization header format")?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err("Invalid Authorization header format"),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))
    }
}
