// src/handlers/docs.rs

use axum::{Json, response::IntoResponse};
use utoipa::OpenApi;

use crate::models::{
    category::Category,
    coins::{BalanceResponse, CreditRequest},
    leaderboard::{LeaderboardEntry, LeaderboardOwner, LeaderboardRow, RankResponse},
    question::PublicQuestion,
    quiz_session::{
        AnswerResult, CompleteSessionRequest, CompletionOutcome, CreateSessionRequest, QuizSession,
        SessionWithQuestions, SubmitAnswerRequest, UnlockCharacterRequest, UnlockResult,
    },
    user::{CreateUserRequest, UpdateLocationRequest, User},
};

/// Schema catalogue for client generators.
#[derive(OpenApi)]
#[openapi(
    info(title = "Trivia Backend API"),
    components(schemas(
        Category,
        User,
        CreateUserRequest,
        UpdateLocationRequest,
        PublicQuestion,
        QuizSession,
        CreateSessionRequest,
        SessionWithQuestions,
        SubmitAnswerRequest,
        AnswerResult,
        UnlockCharacterRequest,
        UnlockResult,
        CompleteSessionRequest,
        CompletionOutcome,
        LeaderboardEntry,
        LeaderboardOwner,
        LeaderboardRow,
        RankResponse,
        CreditRequest,
        BalanceResponse,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
