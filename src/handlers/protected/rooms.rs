// handlers/protected/rooms.rs - POST /rooms/create, PATCH /rooms/update/:id, DELETE /rooms/delete/:id

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::auth::AuthUser;
use crate::database::{Room, RoomChanges};
use crate::handlers::RoomId;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::validation::{null_as_default, required, ValidatedJson};

/// Body of both room create and room update.
#[derive(Debug, Deserialize, Validate)]
pub struct RoomRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom = "required", length(max = 100))]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub private: bool,
}

pub async fn room_create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<RoomRequest>,
) -> ApiResult<Room> {
    let room = state.rooms.create(&user, &body.name, body.private).await?;
    Ok(ApiResponse::created(room))
}

/// Only the creator may rename a room or change its privacy flag.
pub async fn room_update(
    State(state): State<AppState>,
    user: AuthUser,
    RoomId(id): RoomId,
    ValidatedJson(body): ValidatedJson<RoomRequest>,
) -> ApiResult<()> {
    let changes = RoomChanges {
        name: body.name,
        is_private: body.private,
    };
    state.rooms.update(&user, id, changes).await?;
    Ok(ApiResponse::no_content())
}

pub async fn room_delete(State(state): State<AppState>, user: AuthUser, RoomId(id): RoomId) -> ApiResult<()> {
    state.rooms.delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}
