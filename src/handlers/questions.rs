// src/handlers/questions.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    config::{DEFAULT_SAMPLE_SIZE, MAX_SAMPLE_SIZE},
    error::AppError,
    models::{
        category::Category,
        question::{PublicQuestion, RandomQuestionsQuery},
    },
    services::quiz::QuizService,
};

/// Random draw from one category, answers withheld.
///
/// Defaults to Geography and 10 questions. May return fewer than requested
/// when the bank is short and the trivia source is unavailable.
pub async fn random_questions(
    State(quiz): State<Arc<QuizService>>,
    Query(query): Query<RandomQuestionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let category = match query.category.as_deref() {
        Some(raw) => raw.parse::<Category>()?,
        None => Category::Geography,
    };

    let limit = query.limit.unwrap_or(DEFAULT_SAMPLE_SIZE);
    if !(1..=MAX_SAMPLE_SIZE).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_SAMPLE_SIZE
        )));
    }

    let questions = quiz.bank().sample(category, limit).await?;
    let public: Vec<PublicQuestion> = questions.iter().map(PublicQuestion::from).collect();

    Ok(Json(public))
}
