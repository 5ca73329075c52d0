//! # Chat Socket Handler
//!
//! `GET /ws/chat/{room_id}?token=<access token>`
//!
//! The token is checked before the upgrade. Room access is checked before the
//! connection is registered: an unknown room is closed with code 4004 and a
//! non-participant with code 4003.
//!
//! Once registered, each connection runs two tasks: a reader that handles
//! inbound events and a writer that drains the connection's registry channel.
//! When either finishes the other is aborted and the connection leaves the room.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::AppError;
use crate::models::{AppState, ChatRoom, ClientEvent, SendMessageRequest, ServerEvent};
use crate::services::chat::ChatService;
use crate::services::registry::{ConnectionHandle, ConnectionId};

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: String,
}

pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Query(query): Query<SocketQuery>,
) -> Response {
    let user_id = match state.jwt_service.authenticate(&query.token) {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(room_id, error = %e, "Chat socket rejected: invalid token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let access = ChatService::authorize_room(&state.db_pool, room_id, user_id).await;

    let span = info_span!("chat_socket", room_id, user_id);
    ws.on_upgrade(move |socket| {
        async move {
            match access {
                Ok(room) => handle_socket(socket, state, room, user_id).await,
                Err(e) => refuse(socket, e).await,
            }
        }
        .instrument(span)
    })
}

/// Closes a socket that failed the room access check.
async fn refuse(mut socket: WebSocket, error: AppError) {
    let code = error.close_code();
    info!(code, reason = %error, "Refusing chat socket");

    let frame = CloseFrame {
        code,
        reason: error.to_string().into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Failed to send close frame");
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: ChatRoom, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();

    let (handle, mut rx) = ConnectionHandle::new(user_id);
    let connection_id = handle.id();
    state.registry.join(room.id, handle);
    info!(%connection_id, "Chat socket connected");

    let mut send_task = tokio::spawn(
        async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = sender.send(Message::Text(frame)).await {
                    debug!(error = %e, "Socket write failed, stopping writer");
                    break;
                }
            }
        }
        .in_current_span(),
    );

    let recv_state = Arc::clone(&state);
    let recv_room = room.clone();
    let mut recv_task = tokio::spawn(
        async move {
            while let Some(msg) = receiver.next().await {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(error = %e, "Chat socket error");
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => {
                            handle_event(&recv_state, &recv_room, user_id, connection_id, event)
                                .await
                        }
                        Err(e) => warn!(error = %e, "Ignoring malformed chat frame"),
                    },
                    Message::Close(_) => {
                        debug!("Client requested close");
                        break;
                    }
                    _ => {}
                }
            }
        }
        .in_current_span(),
    );

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.registry.leave(room.id, connection_id);
    info!(%connection_id, "Chat socket disconnected");
}

/// Dispatches one inbound event. Failures are logged; the connection stays open.
async fn handle_event(
    state: &AppState,
    room: &ChatRoom,
    user_id: i64,
    connection_id: ConnectionId,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Message { content } => {
            let request = SendMessageRequest { content };
            if let Err(e) = ChatService::send_text_message(state, room, user_id, request).await {
                warn!(error = %e, "Failed to send chat message");
            }
        }
        ClientEvent::Typing => {
            state
                .registry
                .broadcast(room.id, &ServerEvent::Typing { user_id }, Some(connection_id));
        }
        ClientEvent::Read => match ChatService::mark_read(&state.db_pool, room.id, user_id).await {
            Ok(_) => {
                state
                    .registry
                    .broadcast(room.id, &ServerEvent::Read { user_id }, Some(connection_id));
            }
            Err(e) => warn!(error = %e, "Failed to mark messages read"),
        },
    }
}
