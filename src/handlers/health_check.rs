//! # Health Check Handler
//!
//! Liveness and database reachability probe for load balancers and
//! deployment tooling.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use tracing::{debug, error, instrument};

use crate::models::AppState;

/// Health check endpoint.
///
/// Runs a trivial query so that an instance whose pool cannot reach the
/// database is taken out of rotation.
///
/// # Returns
///
/// - `200 OK` with an empty body - The database answered
/// - `503 Service Unavailable` - The database query failed
#[instrument(skip_all)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => {
            debug!("Health check passed");
            StatusCode::OK
        }
        Err(e) => {
            error!(error = %e, "Health check failed: database unreachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
