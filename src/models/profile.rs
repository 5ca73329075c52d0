use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Clone, Copy)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// Account-level fields of a prospective match
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub user_id: i64,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
}

/// Self-description and stated preferences of a user.
///
/// The `ideal_*` fields are only read on the requester's side; the rest only
/// on the candidate's side. Any field may be unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub height: Option<i32>,
    pub location: Option<String>,
    pub religion: Option<String>,
    pub smoking: Option<String>,
    pub job: Option<String>,
    pub education: Option<String>,
    pub introduction: Option<String>,
    pub ideal_age_min: Option<i32>,
    pub ideal_age_max: Option<i32>,
    pub ideal_height_min: Option<i32>,
    pub ideal_height_max: Option<i32>,
    pub ideal_location: Option<String>,
    pub ideal_religion: Option<String>,
    pub ideal_smoking: Option<String>,
}
