// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::leaderboard::{LeaderboardFilter, LeaderboardQuery},
    services::quiz::QuizService,
};

/// Top entries ordered by rank, newest day first. Every filter is optional;
/// country and continent match the owner's current profile.
pub async fn get_leaderboard(
    State(quiz): State<Arc<QuizService>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = LeaderboardFilter::try_from(query)?;
    let rows = quiz.leaderboard().query(&filter).await?;

    Ok(Json(rows))
}
