use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::services::{
    jwt::JwtService, notification::NotificationService, registry::ConnectionRegistry,
};

/// Application state shared across requests. Needs to be thread-safe.
pub struct AppState {
    /// The PostgreSQL database connection pool.
    pub db_pool: PgPool,
    /// Live chat connections, grouped by room.
    pub registry: Arc<ConnectionRegistry>,
    /// Push notification dispatcher used after chat messages are stored.
    pub notifier: Arc<dyn NotificationService>,
    /// JWT service for token validation.
    pub jwt_service: JwtService,
}

impl AppState {
    /// Creates a new application state with the provided services.
    ///
    /// # Arguments
    ///
    /// * `db_pool` - PostgreSQL database connection pool
    /// * `registry` - Connection registry shared by every chat socket of this process
    /// * `notifier` - Service for dispatching push notifications
    /// * `jwt_service` - Service for JWT token operations
    pub fn new(
        db_pool: PgPool,
        registry: Arc<ConnectionRegistry>,
        notifier: Arc<dyn NotificationService>,
        jwt_service: JwtService,
    ) -> Self {
        info!("Initializing application state");

        Self {
            db_pool,
            registry,
            notifier,
            jwt_service,
        }
    }
}
