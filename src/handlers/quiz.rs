// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz_session::{
        CompleteSessionRequest, CreateSessionRequest, SubmitAnswerRequest, UnlockCharacterRequest,
    },
    services::quiz::QuizService,
    utils::jwt::Claims,
};

/// Starts a session over a random draw. The session length is the number of
/// questions actually drawn, which can be lower than requested.
pub async fn create_session(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let created = quiz
        .create(claims.user_id(), req.category, req.total_questions)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_session(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let session = quiz.owned_session(claims.user_id(), id).await?;
    Ok(Json(session))
}

pub async fn submit_answer(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let result = quiz
        .submit_answer(claims.user_id(), id, req.question_index, &req.answer)
        .await?;

    Ok(Json(result))
}

/// Reveals one answer character for one coin. 402 when the balance is empty.
pub async fn unlock_character(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<UnlockCharacterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let result = quiz
        .unlock_character(claims.user_id(), id, req.question_index, req.character_index)
        .await?;

    Ok(Json(result))
}

/// Completes a session once.
///
/// * 200 when the profile totals and the leaderboard entry were both written.
/// * 207 when the session is completed but a follow-up write failed; the
///   body lists what is missing under `warnings`.
/// * 409 on a repeated completion.
pub async fn complete_session(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    body: Option<Json<CompleteSessionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let outcome = quiz.complete(claims.user_id(), id, &req).await?;
    let status = if outcome.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome)))
}
