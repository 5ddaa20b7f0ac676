// src/services/leaderboard.rs

use chrono::{NaiveDate, Utc};

use crate::{
    config::LEADERBOARD_LIMIT,
    error::AppError,
    models::{
        category::Category,
        leaderboard::{LeaderboardEntry, LeaderboardFilter, LeaderboardQuery, LeaderboardRow},
    },
    store::{DynStore, Store},
};

/// Partitions are calendar days in UTC, so each day starts every category empty.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Clone)]
pub struct Leaderboard {
    store: DynStore,
}

impl Leaderboard {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// Inserts a completion into `date`'s partition and re-ranks that partition.
    pub async fn record_completion(
        &self,
        user_id: &str,
        session_id: i64,
        category: Category,
        score: i32,
        date: NaiveDate,
    ) -> Result<LeaderboardEntry, AppError> {
        let entry = self
            .store
            .insert_leaderboard_entry(user_id, session_id, category, score, date)
            .await?;

        tracing::info!(
            "Leaderboard {} {}: {} scored {} (rank {})",
            category,
            date,
            user_id,
            score,
            entry.rank
        );
        Ok(entry)
    }

    pub async fn query(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardRow>, AppError> {
        self.store.query_leaderboard(filter).await
    }

    /// Rank of the user's best entry in the partition, or 0 when unranked.
    pub async fn rank_of(&self, user_id: &str, category: Category, date: NaiveDate) -> Result<i32, AppError> {
        Ok(self.store.rank_of(user_id, category, date).await?.unwrap_or(0))
    }
}

impl TryFrom<LeaderboardQuery> for LeaderboardFilter {
    type Error = AppError;

    fn try_from(query: LeaderboardQuery) -> Result<Self, Self::Error> {
        let category = query.category.as_deref().map(str::parse::<Category>).transpose()?;
        let limit = query.limit.unwrap_or(LEADERBOARD_LIMIT);
        if !(1..=LEADERBOARD_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                LEADERBOARD_LIMIT
            )));
        }

        Ok(Self {
            category,
            country: query.country.filter(|c| !c.is_empty()),
            continent: query.continent.filter(|c| !c.is_empty()),
            date: query.date,
            limit,
        })
    }
}
