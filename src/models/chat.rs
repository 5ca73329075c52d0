use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use validator::Validate;

use crate::utils::constant::MAX_MESSAGE_LENGTH;

/// A two-participant conversation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRoom {
    pub id: i32,
    pub user1_id: i64,
    pub user2_id: i64,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
}

impl ChatRoom {
    #[inline]
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The other participant. Only meaningful for a participant's own id.
    #[inline]
    pub fn partner_of(&self, user_id: i64) -> i64 {
        if self.user1_id == user_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "message_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub room_id: i32,
    pub sender_id: i64,
    pub content: Option<String>,
    pub message_type: MessageType,
    pub image_url: Option<String>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Most recent message of a room, as shown in the room list
#[derive(Debug, Serialize, Deserialize)]
pub struct LastMessage {
    pub content: Option<String>,
    pub message_type: MessageType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: i32,
    pub partner_id: i64,
    pub last_message: Option<LastMessage>,
    pub unread_count: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(range(min = 1))]
    pub partner_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: i32,
    /// False when an existing room for the pair was reactivated
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = MAX_MESSAGE_LENGTH))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagePage {
    pub room_id: i32,
    pub messages: Vec<ChatMessage>,
}

/// Frames a client may send over the chat socket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Message { content: String },
    Typing,
    Read,
}

/// Message fields pushed to connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: i64,
    pub sender_id: i64,
    pub content: Option<String>,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&ChatMessage> for MessagePayload {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            message_type: message.message_type,
            image_url: message.image_url.clone(),
            created_at: message.created_at,
        }
    }
}

/// Frames the server pushes to every connection of a room
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Message { message: MessagePayload },
    Typing { user_id: i64 },
    Read { user_id: i64 },
}
