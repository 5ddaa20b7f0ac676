// src/models/quiz_session.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{category::Category, leaderboard::LeaderboardEntry, question::PublicQuestion};

/// One quiz attempt. Once `is_completed` flips, the row is frozen.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizSession {
    pub id: i64,
    pub user_id: String,
    pub category: Category,
    pub total_questions: i32,
    /// Index of the next question awaiting an answer.
    pub current_index: i32,
    pub score: i32,
    pub correct_answers: i32,
    pub is_completed: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSessionRequest {
    pub category: Category,
    #[validate(range(min = 1, max = 50))]
    pub total_questions: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionWithQuestions {
    pub session: QuizSession,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitAnswerRequest {
    #[validate(range(min = 0))]
    pub question_index: i32,
    #[validate(length(max = 200))]
    pub answer: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResult {
    pub correct: bool,
    pub points_awarded: i32,
    pub correct_answer: String,
    pub session: QuizSession,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UnlockCharacterRequest {
    #[validate(range(min = 0))]
    pub question_index: i32,
    #[validate(range(min = 0))]
    pub character_index: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnlockResult {
    pub character: String,
    pub character_index: i32,
    pub remaining_coins: i32,
}

/// Final tallies. Omitted fields fall back to the persisted running tallies.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CompleteSessionRequest {
    #[validate(range(min = 0))]
    pub score: Option<i32>,
    #[validate(range(min = 0))]
    pub correct_answers: Option<i32>,
}

/// Result of a terminal completion. `warnings` lists side effects that failed.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletionOutcome {
    pub session: QuizSession,
    pub leaderboard_entry: Option<LeaderboardEntry>,
    pub warnings: Vec<String>,
}

impl CompletionOutcome {
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Store-level result of the conditional completion write.
#[derive(Debug)]
pub enum CompleteWrite {
    Completed(QuizSession),
    AlreadyCompleted,
    NotFound,
}
