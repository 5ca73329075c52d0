use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Compatibility of one candidate for one requester.
///
/// `breakdown` maps criterion names (`age`, `height`, `location`, `religion`,
/// `smoking`, `completeness`, `base`) to the points they contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub job: Option<String>,
    pub location: Option<String>,
    pub introduction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: i64,
    pub name: String,
    pub age: Option<i32>,
    /// Rounded to one decimal place
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub total: usize,
    pub recommendations: Vec<Recommendation>,
}
