use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{info, instrument};

use super::AdminState;
use crate::error::AppResult;
use crate::handlers::RecommendationQuery;
use crate::models::RecommendationsResponse;
use crate::services::matching::MatchingService;
use crate::utils::constant::DEFAULT_ADMIN_RECOMMENDATION_LIMIT;

/// Ranked recommendations for any user, for operators reviewing the matcher.
///
/// GET /api/admin/recommendations/{user_id} ?limit=20
#[instrument(skip(state, query))]
pub async fn get_user_recommendations(
    State(state): State<Arc<AdminState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let limit = query.effective_limit(DEFAULT_ADMIN_RECOMMENDATION_LIMIT);
    let recommendations = MatchingService::recommend(&state.db_pool, user_id, limit).await?;

    info!(count = recommendations.len(), "Admin fetched recommendations");
    Ok(Json(RecommendationsResponse {
        total: recommendations.len(),
        recommendations,
    }))
}
