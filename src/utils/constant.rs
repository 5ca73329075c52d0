//! # Application Constants
//!
//! This module defines configuration constants used throughout the Pairline application.
//! These constants control timeouts, paging limits and the match scoring rubric.

use std::time::Duration;

/// Upper bound for a single best-effort call to the notification service
///
/// Push delivery is never awaited by the request that triggered it, but the
/// detached task gives up after this long.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Expiration time for JWT access tokens
pub const ACCESS_TOKEN_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Maximum number of pooled PostgreSQL connections
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Maximum length of a chat text message, in characters
pub const MAX_MESSAGE_LENGTH: u64 = 2000;

/// Number of leading characters of a message shown in push notifications
pub const MESSAGE_PREVIEW_CHARS: usize = 50;

/// Number of leading characters of a candidate introduction shown in recommendations
pub const INTRODUCTION_PREVIEW_CHARS: usize = 100;

/// Default and maximum page sizes for message history
pub const DEFAULT_MESSAGE_PAGE: i64 = 50;
pub const MAX_MESSAGE_PAGE: i64 = 100;

/// Default page sizes for recommendation lists
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
pub const DEFAULT_ADMIN_RECOMMENDATION_LIMIT: usize = 20;
pub const MAX_RECOMMENDATION_LIMIT: usize = 100;

// Match scoring rubric, in points
pub const AGE_MATCH_POINTS: f64 = 15.0;
pub const HEIGHT_MATCH_POINTS: f64 = 15.0;
pub const LOCATION_MATCH_POINTS: f64 = 10.0;
pub const RELIGION_MATCH_POINTS: f64 = 10.0;
pub const SMOKING_MATCH_POINTS: f64 = 10.0;
pub const COMPLETENESS_MAX_POINTS: f64 = 20.0;
pub const BASE_MATCH_POINTS: f64 = 20.0;

/// Score given when either side has no profile to compare
pub const NEUTRAL_MATCH_SCORE: f64 = 50.0;

/// Hard ceiling of any compatibility score
pub const MAX_MATCH_SCORE: f64 = 100.0;

/// WebSocket close code sent when the requested chat room does not exist
pub const CLOSE_ROOM_NOT_FOUND: u16 = 4004;

/// WebSocket close code sent when the user is not one of the room's participants
pub const CLOSE_NOT_PARTICIPANT: u16 = 4003;

/// WebSocket close code for unexpected server-side failures (RFC 6455 "internal error")
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;
