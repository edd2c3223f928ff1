// handlers/protected/messages.rs - message CRUD and listing

use axum::extract::{Query, State};
use serde::Deserialize;
use validator::Validate;

use crate::auth::AuthUser;
use crate::database::Message;
use crate::handlers::{parse_optional_id, MessageId};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::validation::{exactly_one_target, null_as_default, required, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    pub room_id: Option<i64>,
    pub receiver_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom = "required", length(min = 3, max = 4000))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMessageRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom = "required", length(min = 3, max = 4000))]
    pub content: String,
}

/// Raw query; ids are parsed by hand so bad values get a specific 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub room_id: Option<String>,
    pub receiver_id: Option<String>,
}

/// POST /messages/create - the sender is always the authenticated user
pub async fn message_create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateMessageRequest>,
) -> ApiResult<Message> {
    let target = exactly_one_target(body.room_id, body.receiver_id)?;
    let message = state.messages.create(&user, target, &body.content).await?;
    Ok(ApiResponse::created(message))
}

/// PATCH /messages/update/:id
pub async fn message_update(
    State(state): State<AppState>,
    user: AuthUser,
    MessageId(id): MessageId,
    ValidatedJson(body): ValidatedJson<UpdateMessageRequest>,
) -> ApiResult<()> {
    state.messages.update(&user, id, &body.content).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /messages/delete/:id
pub async fn message_delete(State(state): State<AppState>, user: AuthUser, MessageId(id): MessageId) -> ApiResult<()> {
    state.messages.delete(&user, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /messages/:id
pub async fn message_get(State(state): State<AppState>, user: AuthUser, MessageId(id): MessageId) -> ApiResult<Message> {
    Ok(ApiResponse::success(state.messages.get(&user, id).await?))
}

/// GET /messages/list?room_id=N or ?receiver_id=N
pub async fn message_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Message>> {
    let room_id = parse_optional_id(query.room_id.as_deref(), "Invalid room_id")?;
    let receiver_id = parse_optional_id(query.receiver_id.as_deref(), "Invalid receiver_id")?;
    let scope = exactly_one_target(room_id, receiver_id)?;
    Ok(ApiResponse::success(state.messages.list(&user, scope).await?))
}
