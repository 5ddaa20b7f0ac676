// src/models/leaderboard.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::category::Category;

/// Represents the 'leaderboard_entries' table.
/// One row per completed session, partitioned by (category, entry_date).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Doubles as the insertion sequence used to break score ties.
    pub id: i64,
    pub user_id: String,
    pub session_id: i64,
    pub score: i32,
    pub category: Category,
    pub entry_date: NaiveDate,
    /// 1-based position in the partition. Contiguous, no gaps.
    pub rank: i32,
}

/// Owner details joined at query time from the owner's current profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardOwner {
    pub username: String,
    pub country: Option<String>,
    pub continent: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardRow {
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
    pub user: LeaderboardOwner,
}

/// Leaderboard filters. Every omitted field is a wildcard.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardFilter {
    pub category: Option<Category>,
    pub country: Option<String>,
    pub continent: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    pub category: Option<String>,
    pub country: Option<String>,
    pub continent: Option<String>,
    /// Calendar day, `YYYY-MM-DD` (UTC).
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RankQuery {
    pub category: String,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RankResponse {
    /// 0 when the user has no entry in the partition.
    pub rank: i32,
    pub category: Category,
    pub date: NaiveDate,
}
