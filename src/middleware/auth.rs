//! # Authentication Middleware
//!
//! Guards the REST routes with `Authorization: Bearer <access token>`. The
//! chat socket cannot send headers and authenticates in its own handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::models::AppState;

/// Identity of the caller, inserted into request extensions by
/// [`auth_middleware`].
///
/// ```rust
/// use axum::{extract::Extension, response::IntoResponse};
/// use pairline::middleware::AuthUser;
/// async fn protected_handler(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
///     format!("Hello user: {}", user.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Token part of a `Bearer` authorization header, if there is one.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects the request with `401 Unauthorized` unless it carries a valid
/// access token whose subject is a numeric user id.
#[instrument(
    skip_all,
    fields(
        method = %req.method(),
        uri = %req.uri(),
        request_id = %uuid::Uuid::new_v4()
    )
)]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers()) else {
        warn!("Missing or malformed Authorization header");
        return Err(AppError::Unauthorized("Missing bearer token"));
    };

    let claims = state.jwt_service.validate_access_token(token).map_err(|e| {
        warn!(error = %e, "Token validation failed");
        AppError::Unauthorized("Invalid or expired token")
    })?;

    let user_id = claims.user_id().map_err(|_| {
        warn!(sub = %claims.sub, "Token subject is not a user id");
        AppError::Unauthorized("Invalid or expired token")
    })?;

    debug!(user_id, "Authentication successful");
    req.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(req).await)
}
