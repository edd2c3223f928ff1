// handlers/public/rooms.rs - GET /rooms/:id, GET /rooms/list

use axum::extract::State;

use crate::database::Room;
use crate::handlers::RoomId;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

pub async fn room_get(State(state): State<AppState>, RoomId(id): RoomId) -> ApiResult<Room> {
    let room = state.rooms.get(id).await?;
    Ok(ApiResponse::success(room))
}

pub async fn room_list(State(state): State<AppState>) -> ApiResult<Vec<Room>> {
    Ok(ApiResponse::success(state.rooms.list().await?))
}
