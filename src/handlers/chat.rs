//! # Chat REST Handlers
//!
//! Room management and message history for authenticated users. Messages sent
//! here follow the same path as messages sent over the chat socket, so both
//! participants' live connections see them immediately.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{
    AppState, CreateRoomRequest, CreateRoomResponse, MessagePage, SendMessageRequest,
    SendMessageResponse,
};
use crate::services::chat::ChatService;
use crate::utils::constant::{DEFAULT_MESSAGE_PAGE, MAX_MESSAGE_PAGE};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub limit: i64,
    pub before_id: Option<i64>,
}
fn default_page() -> i64 {
    DEFAULT_MESSAGE_PAGE
}

/// Opens a chat room with another user.
///
/// POST /api/chat/rooms CreateRoomRequest
///
/// # Returns
///
/// - `201 Created` with CreateRoomResponse - A new room was created
/// - `200 OK` with CreateRoomResponse - The pair's existing room was reactivated
/// - `400 Bad Request` - Invalid partner id, or partner is the caller
/// - `404 Not Found` - Partner does not exist or has withdrawn
/// - `401 Unauthorized` - Missing or invalid authentication token
/// - `500 Internal Server Error` - Database error
#[instrument(
    skip_all,
    fields(
        user_id = user.user_id,
        partner_id = payload.partner_id,
        request_id = %uuid::Uuid::new_v4()
    )
)]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateRoomRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    if payload.partner_id == user.user_id {
        warn!("User attempted to open a chat room with themselves");
        return Err(AppError::BadRequest("Cannot open a chat room with yourself"));
    }

    if !ChatService::user_exists(&state.db_pool, payload.partner_id).await? {
        warn!("Chat partner does not exist");
        return Err(AppError::NotFound("Partner not found"));
    }

    let (room, created) =
        ChatService::open_room(&state.db_pool, user.user_id, payload.partner_id).await?;
    info!(room_id = room.id, created, "Chat room ready");

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(CreateRoomResponse {
            room_id: room.id,
            created,
        }),
    ))
}

/// Lists the caller's active chat rooms.
///
/// GET /api/chat/rooms
///
/// Rooms are ordered by last activity, newest first; rooms without any
/// message yet come first.
///
/// # Returns
///
/// - `200 OK` with `Vec<RoomSummary>`
/// - `401 Unauthorized` - Missing or invalid authentication token
/// - `500 Internal Server Error` - Database error
#[instrument(skip_all, fields(user_id = user.user_id, request_id = %uuid::Uuid::new_v4()))]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let rooms = ChatService::list_rooms(&state.db_pool, user.user_id).await?;
    debug!(count = rooms.len(), "Chat rooms listed");
    Ok(Json(rooms))
}

/// Gets a page of message history and marks the partner's messages as read.
///
/// GET /api/chat/rooms/{room_id}/messages ?limit=50&before_id=123
///
/// # Returns
///
/// - `200 OK` with MessagePage - Messages in ascending id order
/// - `403 Forbidden` - Caller is not a participant of the room
/// - `404 Not Found` - Room does not exist
/// - `500 Internal Server Error` - Database error
#[instrument(
    skip_all,
    fields(user_id = user.user_id, room_id = room_id, request_id = %uuid::Uuid::new_v4())
)]
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<i32>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let room = ChatService::authorize_room(&state.db_pool, room_id, user.user_id).await?;

    let limit = query.limit.clamp(1, MAX_MESSAGE_PAGE);
    let messages =
        ChatService::fetch_messages(&state.db_pool, room.id, user.user_id, limit, query.before_id)
            .await?;

    debug!(count = messages.len(), "Message history fetched");
    Ok(Json(MessagePage {
        room_id: room.id,
        messages,
    }))
}

/// Sends a text message to a room.
///
/// POST /api/chat/rooms/{room_id}/messages SendMessageRequest
///
/// The message is stored, pushed to every live connection of the room and a
/// push notification is dispatched to the partner in the background.
///
/// # Returns
///
/// - `201 Created` with SendMessageResponse
/// - `400 Bad Request` - Empty or too long content
/// - `403 Forbidden` - Caller is not a participant of the room
/// - `404 Not Found` - Room does not exist
/// - `500 Internal Server Error` - Database error
#[instrument(
    skip_all,
    fields(user_id = user.user_id, room_id = room_id, request_id = %uuid::Uuid::new_v4())
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(room_id): Path<i32>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let room = ChatService::authorize_room(&state.db_pool, room_id, user.user_id).await?;

    let message = ChatService::send_text_message(&state, &room, user.user_id, payload).await?;
    info!(message_id = message.id, "Message sent");

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message_id: message.id,
        }),
    ))
}
