//! # User Status Types
//!
//! This module defines the UserStatus enum that corresponds to the PostgreSQL
//! user_status enum type in the database. Using a Rust enum provides better
//! performance compared to text conversion and ensures type safety.

use serde::{Deserialize, Serialize};

/// Represents the possible membership status values for a user.
///
/// This enum corresponds directly to the PostgreSQL `user_status` enum type
/// defined in the database migrations.
///
/// # Status Flow
///
/// - `PreMatch` - Registered and waiting for a partner, eligible for recommendations
/// - `Matching` - Currently paired with a partner
/// - `Married` - Matched couple reported a successful marriage
/// - `Expired` - Membership period ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    PreMatch,
    Matching,
    Married,
    Expired,
}
