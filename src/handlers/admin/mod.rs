mod recommendation;

use std::sync::Arc;

use axum::{Router, routing::get};
use sqlx::PgPool;

use recommendation::get_user_recommendations;

pub struct AdminState {
    pub db_pool: PgPool,
}

/// Create the admin router with admin-specific routes
pub fn admin_router(db_pool: PgPool) -> Router {
    let state = Arc::new(AdminState { db_pool });

    Router::new()
        .route(
            "/api/admin/recommendations/{user_id}",
            get(get_user_recommendations),
        )
        .with_state(state)
}
