// handlers/public/auth.rs - POST /login, POST /register

use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::Registration;
use crate::validation::{null_as_default, required, strong_password, username_characters, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom = "required", email, length(max = 255))]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom = "required", length(min = 8, max = 40))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom = "required", email, length(max = 255))]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 8, max = 40), custom = "strong_password")]
    pub password: String,
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 5, max = 30), custom = "username_characters")]
    pub username: String,
}

/// POST /login - exchange email and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let outcome = state.auth.login(&body.email, &body.password).await?;
    Ok(ApiResponse::success(TokenResponse { token: outcome.token }))
}

/// POST /register - create an account; the response never carries the password hash
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> ApiResult<User> {
    let user = state
        .auth
        .register(Registration {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(ApiResponse::created(user))
}
