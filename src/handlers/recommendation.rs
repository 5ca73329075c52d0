use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, State},
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{AppState, RecommendationsResponse};
use crate::services::matching::MatchingService;
use crate::utils::constant::{DEFAULT_RECOMMENDATION_LIMIT, MAX_RECOMMENDATION_LIMIT};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

impl RecommendationQuery {
    pub fn effective_limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, MAX_RECOMMENDATION_LIMIT)
    }
}

/// Gets the caller's ranked match recommendations.
///
/// GET /api/recommendations ?limit=10
///
/// # Returns
///
/// - `200 OK` with RecommendationsResponse - Candidates ordered by score, highest first
/// - `401 Unauthorized` - Missing or invalid authentication token
/// - `404 Not Found` - Caller has no user record
/// - `500 Internal Server Error` - Database error
#[instrument(skip_all, fields(user_id = user.user_id, request_id = %uuid::Uuid::new_v4()))]
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let limit = query.effective_limit(DEFAULT_RECOMMENDATION_LIMIT);
    let recommendations = MatchingService::recommend(&state.db_pool, user.user_id, limit).await?;

    debug!(count = recommendations.len(), "Returning recommendations");
    Ok(Json(RecommendationsResponse {
        total: recommendations.len(),
        recommendations,
    }))
}
