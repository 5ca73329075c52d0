//! # Centralized Error Handling
//!
//! This module provides a unified error handling system for the application.
//! It centralizes error logging and HTTP response generation, and maps the same
//! errors onto WebSocket close codes for the chat socket.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::utils::constant::{CLOSE_INTERNAL_ERROR, CLOSE_NOT_PARTICIPANT, CLOSE_ROOM_NOT_FOUND};

/// Central application error type that encompasses all possible error conditions.
///
/// This enum provides a unified way to handle errors across the application,
/// with automatic conversion to appropriate HTTP responses. _Db errors are logged
/// automatically, while other errors should be logged at the point of creation if needed._
#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error")]
    Db(#[from] sqlx::Error),

    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
}

impl AppError {
    /// Close code used when this error refuses a chat socket.
    pub fn close_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => CLOSE_ROOM_NOT_FOUND,
            AppError::Forbidden(_) => CLOSE_NOT_PARTICIPANT,
            _ => CLOSE_INTERNAL_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Db(e) = &self {
            // Log detailed database errors for internal tracking
            error!(?e, "Database error occurred");
        }

        let (status, message) = match self {
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".into()),
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.into()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.into()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.into()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.into()),
        };

        let body = Json(ErrorBody { message });
        (status, body).into_response()
    }
}

/// Convenience Result type alias that uses AppError as the error type.
pub type AppResult<T> = Result<T, AppError>;
