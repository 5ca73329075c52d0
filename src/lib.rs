//! # Pairline - Dating Platform Chat and Matching Backend
//!
//! ## Modules
//!
//! - [`error`] - Application error type and its HTTP / close code mappings
//! - [`handlers`] - HTTP and WebSocket request handlers
//! - [`middleware`] - Custom middleware for authentication
//! - [`models`] - Data types shared by handlers and services
//! - [`services`] - Business logic services (chat, connection registry, matching, etc.)
//! - [`utils`] - Utility functions and constants

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::env;
use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{
    chat_socket, create_room, get_messages, get_recommendations, health_check, list_rooms,
    send_message,
};
use crate::middleware::auth_middleware;
use crate::models::AppState;
use crate::services::jwt::JwtService;
use crate::services::notification::{HttpNotifier, LogNotifier, NotificationService};
use crate::services::registry::ConnectionRegistry;
use crate::utils::{secret::read_secret, static_object::NOTIFICATION_SERVICE_URL};

/// Creates an Axum router with default notification service configuration.
///
/// This is a convenience function that calls [`app_with_services`] with no custom
/// notifier and a fresh connection registry, causing the notifier to be chosen
/// from the `APP_ENV` environment variable.
#[inline]
pub fn app(db_pool: PgPool) -> Router {
    app_with_services(db_pool, None, Arc::new(ConnectionRegistry::new()))
}

/// Creates an Axum router with application routes and state.
///
/// # Arguments
///
/// * `db_pool` - PostgreSQL database connection pool
/// * `notifier` - Optional custom notification service. If None, will auto-detect based on APP_ENV
/// * `registry` - Connection registry shared by every chat socket served by this router
///
/// # Environment Variables
///
/// - `APP_ENV` - "production" uses HttpNotifier, otherwise uses LogNotifier (mock)
/// - `NOTIFICATION_SERVICE_URL` - Base URL of the notification service in production
/// - `JWT_SECRET` / `JWT_SECRET_FILE` - Required for JWT token validation
///
/// # Returns
///
/// A configured Axum router with all application routes and middleware
pub fn app_with_services(
    db_pool: PgPool,
    notifier: Option<Arc<dyn NotificationService>>,
    registry: Arc<ConnectionRegistry>,
) -> Router {
    let notifier: Arc<dyn NotificationService> = if let Some(service) = notifier {
        service
    } else {
        let app_env = env::var("APP_ENV")
            .expect("Env variable `APP_ENV` should be set")
            .to_ascii_lowercase();

        if app_env == "production" {
            info!("Running in production mode with [HttpNotifier]");
            Arc::new(HttpNotifier::new(NOTIFICATION_SERVICE_URL.clone()))
        } else {
            info!("Running in development mode with [LogNotifier (Mock)]");
            Arc::new(LogNotifier)
        }
    };

    let jwt_secret = read_secret("JWT_SECRET").expect("JWT secret should be configured");
    let jwt_service = JwtService::from_secret(jwt_secret.as_bytes());

    let state = Arc::new(AppState::new(db_pool, registry, notifier, jwt_service));

    let protected_routes = Router::new()
        .route("/api/chat/rooms", post(create_room).get(list_rooms))
        .route(
            "/api/chat/rooms/{room_id}/messages",
            get(get_messages).post(send_message),
        )
        .route("/api/recommendations", get(get_recommendations))
        .route_layer(from_fn_with_state(Arc::clone(&state), auth_middleware));

    // The chat socket authenticates with a `token` query parameter, since
    // browsers cannot set headers on a WebSocket handshake.
    let public_routes = Router::new()
        .route("/health-check", get(health_check))
        .route("/ws/chat/{room_id}", get(chat_socket));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
