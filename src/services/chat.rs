//! # Chat Service
//!
//! Persistence for chat rooms and messages, plus the send path shared by the
//! REST endpoint and the chat socket: store the message, fan it out to the
//! room's live connections, then notify the recipient.

use serde_json::json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    AppState, ChatMessage, ChatRoom, LastMessage, MessageType, RoomSummary, SendMessageRequest,
    ServerEvent,
};
use crate::services::notification::{NotificationKind, NotificationRequest, dispatch_detached};
use crate::utils::constant::MESSAGE_PREVIEW_CHARS;

pub struct ChatService;

#[derive(FromRow)]
struct RoomSummaryRow {
    room_id: i32,
    partner_id: i64,
    last_message_at: Option<OffsetDateTime>,
    last_content: Option<String>,
    last_message_type: Option<MessageType>,
    last_created_at: Option<OffsetDateTime>,
    unread_count: i64,
}

impl From<RoomSummaryRow> for RoomSummary {
    fn from(row: RoomSummaryRow) -> Self {
        let last_message = match (row.last_message_type, row.last_created_at) {
            (Some(message_type), Some(created_at)) => Some(LastMessage {
                content: row.last_content,
                message_type,
                created_at,
            }),
            _ => None,
        };

        Self {
            room_id: row.room_id,
            partner_id: row.partner_id,
            last_message,
            unread_count: row.unread_count,
            last_message_at: row.last_message_at,
        }
    }
}

#[derive(FromRow)]
struct OpenedRoomRow {
    #[sqlx(flatten)]
    room: ChatRoom,
    created: bool,
}

const ROOM_COLUMNS: &str = "id, user1_id, user2_id, is_active, created_at, last_message_at";
const MESSAGE_COLUMNS: &str =
    "id, room_id, sender_id, content, message_type, image_url, is_read, created_at";

impl ChatService {
    pub async fn find_room(db_pool: &PgPool, room_id: i32) -> Result<Option<ChatRoom>, sqlx::Error> {
        sqlx::query_as::<_, ChatRoom>(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id = $1"
        ))
        .bind(room_id)
        .fetch_optional(db_pool)
        .await
    }

    /// Loads `room_id` and checks that `user_id` is one of its two participants.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] - Room does not exist
    /// - [`AppError::Forbidden`] - User is not a participant
    /// - [`AppError::Db`] - Database error
    pub async fn authorize_room(
        db_pool: &PgPool,
        room_id: i32,
        user_id: i64,
    ) -> AppResult<ChatRoom> {
        let Some(room) = Self::find_room(db_pool, room_id).await? else {
            warn!(room_id, "Chat room not found");
            return Err(AppError::NotFound("Chat room not found"));
        };

        if !room.is_participant(user_id) {
            warn!(room_id, user_id, "User is not a participant of the chat room");
            return Err(AppError::Forbidden("Not a participant of this chat room"));
        }

        Ok(room)
    }

    /// Returns the room shared by the two users, creating it if needed.
    ///
    /// An existing room is reactivated instead of duplicated, regardless of
    /// which participant is stored first. The pair's unique index makes this a
    /// single upsert, so concurrent calls for the same pair converge on one
    /// room. The flag is true when a room was created.
    #[instrument(skip(db_pool), err)]
    pub async fn open_room(
        db_pool: &PgPool,
        user_id: i64,
        partner_id: i64,
    ) -> Result<(ChatRoom, bool), sqlx::Error> {
        // xmax is zero only for a freshly inserted row
        let row = sqlx::query_as::<_, OpenedRoomRow>(&format!(
            r#"
            INSERT INTO chat_rooms (user1_id, user2_id) VALUES ($1, $2)
            ON CONFLICT ((LEAST(user1_id, user2_id)), (GREATEST(user1_id, user2_id)))
            DO UPDATE SET is_active = TRUE
            RETURNING {ROOM_COLUMNS}, (xmax = 0) AS created
            "#
        ))
        .bind(user_id)
        .bind(partner_id)
        .fetch_one(db_pool)
        .await?;

        debug!(room_id = row.room.id, created = row.created, "Chat room opened");
        Ok((row.room, row.created))
    }

    /// Whether `user_id` names an account that has not been withdrawn.
    pub async fn user_exists(db_pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1 AND deleted_at IS NULL)",
        )
        .bind(user_id)
        .fetch_one(db_pool)
        .await
    }

    /// Active rooms of `user_id`, most recently active first (rooms without
    /// messages come first).
    pub async fn list_rooms(db_pool: &PgPool, user_id: i64) -> Result<Vec<RoomSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, RoomSummaryRow>(
            r#"
            SELECT
                r.id AS room_id,
                CASE WHEN r.user1_id = $1 THEN r.user2_id ELSE r.user1_id END AS partner_id,
                r.last_message_at,
                lm.content AS last_content,
                lm.message_type AS last_message_type,
                lm.created_at AS last_created_at,
                (
                    SELECT COUNT(*) FROM messages m
                    WHERE m.room_id = r.id AND m.sender_id <> $1 AND NOT m.is_read
                ) AS unread_count
            FROM chat_rooms r
            LEFT JOIN LATERAL (
                SELECT content, message_type, created_at
                FROM messages
                WHERE room_id = r.id
                ORDER BY id DESC
                LIMIT 1
            ) lm ON TRUE
            WHERE (r.user1_id = $1 OR r.user2_id = $1) AND r.is_active
            ORDER BY r.last_message_at DESC NULLS FIRST, r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(db_pool)
        .await?;

        Ok(rows.into_iter().map(RoomSummary::from).collect())
    }

    /// One page of history, oldest first, ending before `before_id` when given.
    ///
    /// Messages the partner sent are marked read afterwards; the returned page
    /// still shows their state from before this call.
    #[instrument(skip(db_pool), err)]
    pub async fn fetch_messages(
        db_pool: &PgPool,
        room_id: i32,
        reader_id: i64,
        limit: i64,
        before_id: Option<i64>,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE room_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#
        ))
        .bind(room_id)
        .bind(before_id)
        .bind(limit)
        .fetch_all(db_pool)
        .await?;
        messages.reverse();

        Self::mark_read(db_pool, room_id, reader_id).await?;

        Ok(messages)
    }

    /// Marks every unread message in the room not sent by `reader_id` as read.
    pub async fn mark_read(db_pool: &PgPool, room_id: i32, reader_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE WHERE room_id = $1 AND sender_id <> $2 AND NOT is_read",
        )
        .bind(room_id)
        .bind(reader_id)
        .execute(db_pool)
        .await?;

        debug!(room_id, reader_id, updated = result.rows_affected(), "Messages marked read");
        Ok(result.rows_affected())
    }

    /// Stores a text message and bumps the room's activity time in one transaction.
    pub async fn insert_text_message(
        db_pool: &PgPool,
        room_id: i32,
        sender_id: i64,
        content: &str,
    ) -> Result<ChatMessage, sqlx::Error> {
        let mut tx = db_pool.begin().await?;

        let message = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            INSERT INTO messages (room_id, sender_id, content, message_type)
            VALUES ($1, $2, $3, $4)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(room_id)
        .bind(sender_id)
        .bind(content)
        .bind(MessageType::Text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE chat_rooms SET last_message_at = $1 WHERE id = $2")
            .bind(message.created_at)
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Full send path for a text message from `sender_id` into `room`.
    ///
    /// The message is committed first. Only then is it broadcast to every
    /// connection of the room (the sender's own included) and a `new_message`
    /// notification handed off for the partner. Neither side effect can undo
    /// the stored message.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] - Empty or over-long content
    /// - [`AppError::Db`] - The message could not be stored
    #[instrument(skip(state, room, request), fields(room_id = room.id), err)]
    pub async fn send_text_message(
        state: &AppState,
        room: &ChatRoom,
        sender_id: i64,
        request: SendMessageRequest,
    ) -> AppResult<ChatMessage> {
        request.validate()?;

        let message =
            Self::insert_text_message(&state.db_pool, room.id, sender_id, &request.content).await?;

        let delivered = state.registry.broadcast(
            room.id,
            &ServerEvent::Message {
                message: (&message).into(),
            },
            None,
        );
        debug!(message_id = message.id, delivered, "Message stored and broadcast");

        let preview: String = request.content.chars().take(MESSAGE_PREVIEW_CHARS).collect();
        dispatch_detached(
            state.notifier.clone(),
            NotificationRequest {
                user_id: room.partner_of(sender_id),
                notification_type: NotificationKind::NewMessage,
                data: json!({
                    "sender_name": sender_id.to_string(),
                    "preview": preview,
                }),
            },
        );

        Ok(message)
    }
}
