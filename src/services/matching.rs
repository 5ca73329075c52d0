use std::collections::{BTreeMap, HashMap};

use sqlx::PgPool;
use tracing::{debug, instrument, trace, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    Candidate, Gender, MatchScore, ProfileSummary, Recommendation, UserProfile, UserStatus,
};
use crate::utils::{
    constant::{
        AGE_MATCH_POINTS, BASE_MATCH_POINTS, COMPLETENESS_MAX_POINTS, HEIGHT_MATCH_POINTS,
        INTRODUCTION_PREVIEW_CHARS, LOCATION_MATCH_POINTS, MAX_MATCH_SCORE, NEUTRAL_MATCH_SCORE,
        RELIGION_MATCH_POINTS, SMOKING_MATCH_POINTS,
    },
    static_object::NO_PREFERENCE_SENTINEL,
};

pub struct MatchingService;

/// Candidate together with its profile and score, before ranking
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub profile: Option<UserProfile>,
    pub score: MatchScore,
}

impl MatchingService {
    /// Scores `candidate` against the requester's stated preferences.
    ///
    /// Each criterion contributes its points only when both the preference and
    /// the candidate's value are present; a missing field never counts as a
    /// mismatch. Without a profile on either side the neutral score is returned.
    pub fn calculate_match_score(
        requester_profile: Option<&UserProfile>,
        candidate_profile: Option<&UserProfile>,
        candidate: &Candidate,
    ) -> MatchScore {
        let (Some(wanted), Some(profile)) = (requester_profile, candidate_profile) else {
            return MatchScore {
                score: NEUTRAL_MATCH_SCORE,
                breakdown: BTreeMap::from([("base".to_string(), NEUTRAL_MATCH_SCORE)]),
            };
        };

        let mut breakdown = BTreeMap::new();

        if Self::within(candidate.age, wanted.ideal_age_min, wanted.ideal_age_max) {
            breakdown.insert("age".to_string(), AGE_MATCH_POINTS);
        }

        if Self::within(
            profile.height,
            wanted.ideal_height_min,
            wanted.ideal_height_max,
        ) {
            breakdown.insert("height".to_string(), HEIGHT_MATCH_POINTS);
        }

        if let (Some(ideal), Some(location)) = (
            Self::filled(&wanted.ideal_location),
            Self::filled(&profile.location),
        ) && location.contains(ideal)
        {
            breakdown.insert("location".to_string(), LOCATION_MATCH_POINTS);
        }

        if Self::preference_met(&wanted.ideal_religion, &profile.religion) {
            breakdown.insert("religion".to_string(), RELIGION_MATCH_POINTS);
        }

        if Self::preference_met(&wanted.ideal_smoking, &profile.smoking) {
            breakdown.insert("smoking".to_string(), SMOKING_MATCH_POINTS);
        }

        breakdown.insert(
            "completeness".to_string(),
            Self::profile_completeness(profile) * COMPLETENESS_MAX_POINTS,
        );
        breakdown.insert("base".to_string(), BASE_MATCH_POINTS);

        let score = breakdown.values().sum::<f64>().min(MAX_MATCH_SCORE);

        trace!(candidate_id = candidate.user_id, score, "Match score calculated");

        MatchScore { score, breakdown }
    }

    /// True when `value` and both bounds are known and `min <= value <= max`
    fn within(value: Option<i32>, min: Option<i32>, max: Option<i32>) -> bool {
        match (value, min, max) {
            (Some(value), Some(min), Some(max)) => (min..=max).contains(&value),
            _ => false,
        }
    }

    /// Exact match, or the preference is the "no preference" sentinel
    fn preference_met(preference: &Option<String>, value: &Option<String>) -> bool {
        match (Self::filled(preference), Self::filled(value)) {
            (Some(preference), Some(value)) => {
                preference == value || preference == NO_PREFERENCE_SENTINEL.as_str()
            }
            _ => false,
        }
    }

    fn filled(field: &Option<String>) -> Option<&str> {
        field.as_deref().filter(|s| !s.is_empty())
    }

    /// Fraction of job, education and introduction that are filled in
    fn profile_completeness(profile: &UserProfile) -> f64 {
        let fields = [&profile.job, &profile.education, &profile.introduction];
        let filled = fields.iter().filter(|f| Self::filled(f).is_some()).count();
        filled as f64 / fields.len() as f64
    }

    /// Orders candidates by descending score.
    ///
    /// The sort is stable: candidates with equal scores keep the order they
    /// were supplied in, which is ascending user id for [`Self::fetch_candidates`].
    pub fn rank_candidates(mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        scored.sort_by(|a, b| b.score.score.total_cmp(&a.score.score));
        scored
    }

    /// Builds the ranked recommendation list for `user_id`.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] - The requesting user does not exist
    /// - [`AppError::Db`] - Database error
    #[instrument(skip(db_pool), err)]
    pub async fn recommend(
        db_pool: &PgPool,
        user_id: i64,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let Some(requester) = Self::fetch_user(db_pool, user_id).await? else {
            warn!("User not found");
            return Err(AppError::NotFound("User not found"));
        };

        let Some(gender) = requester.gender else {
            debug!("Requester has no gender on record, no candidates to recommend");
            return Ok(Vec::new());
        };

        let requester_profile = Self::fetch_profiles(db_pool, &[user_id])
            .await?
            .remove(&user_id);

        let candidates = Self::fetch_candidates(db_pool, user_id, gender.opposite()).await?;
        let candidate_ids: Vec<i64> = candidates.iter().map(|c| c.user_id).collect();
        let mut profiles = Self::fetch_profiles(db_pool, &candidate_ids).await?;

        let scored = candidates
            .into_iter()
            .map(|candidate| {
                let profile = profiles.remove(&candidate.user_id);
                let score = Self::calculate_match_score(
                    requester_profile.as_ref(),
                    profile.as_ref(),
                    &candidate,
                );
                ScoredCandidate {
                    candidate,
                    profile,
                    score,
                }
            })
            .collect();

        let recommendations: Vec<Recommendation> = Self::rank_candidates(scored)
            .into_iter()
            .take(limit)
            .map(Self::to_recommendation)
            .collect();

        debug!(count = recommendations.len(), "Recommendations generated");
        Ok(recommendations)
    }

    fn to_recommendation(scored: ScoredCandidate) -> Recommendation {
        let ScoredCandidate {
            candidate,
            profile,
            score,
        } = scored;

        Recommendation {
            user_id: candidate.user_id,
            name: candidate.name,
            age: candidate.age,
            score: (score.score * 10.0).round() / 10.0,
            breakdown: score.breakdown,
            profile: profile.map(|p| ProfileSummary {
                job: p.job,
                location: p.location,
                introduction: p
                    .introduction
                    .map(|intro| intro.chars().take(INTRODUCTION_PREVIEW_CHARS).collect()),
            }),
        }
    }

    async fn fetch_user(db_pool: &PgPool, user_id: i64) -> Result<Option<Candidate>, sqlx::Error> {
        sqlx::query_as::<_, Candidate>(
            "SELECT user_id, name, age, gender FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
    }

    /// Users eligible to be recommended to `user_id`: opposite gender, not yet
    /// matched, not banned, not withdrawn. Ordered by user id.
    pub(crate) async fn fetch_candidates(
        db_pool: &PgPool,
        user_id: i64,
        gender: Gender,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        sqlx::query_as::<_, Candidate>(
            r#"
            SELECT user_id, name, age, gender
            FROM users
            WHERE gender = $1
              AND status = $2
              AND NOT is_banned
              AND deleted_at IS NULL
              AND user_id <> $3
            ORDER BY user_id
            "#,
        )
        .bind(gender)
        .bind(UserStatus::PreMatch)
        .bind(user_id)
        .fetch_all(db_pool)
        .await
    }

    async fn fetch_profiles(
        db_pool: &PgPool,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, UserProfile>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT user_id, height, location, religion, smoking, job, education, introduction,
                   ideal_age_min, ideal_age_max, ideal_height_min, ideal_height_max,
                   ideal_location, ideal_religion, ideal_smoking
            FROM user_profiles
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(db_pool)
        .await?;

        Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
    }
}
