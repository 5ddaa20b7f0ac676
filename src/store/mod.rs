// src/store/mod.rs

//! Persistence port.
//!
//! Every method that the core relies on for atomicity is a single call here:
//! `debit_coins` checks and decrements in one step per user, `complete_session`
//! flips the completion flag conditionally, and `insert_leaderboard_entry`
//! inserts and re-ranks its (category, date) partition as one serialized unit.
//! Callers never compose those out of separate reads and writes.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::AppError,
    models::{
        category::Category,
        coins::DebitOutcome,
        leaderboard::{LeaderboardEntry, LeaderboardFilter, LeaderboardRow},
        question::{NewQuestion, Question},
        quiz_session::{CompleteWrite, QuizSession},
        user::{NewUser, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DynStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Creates a profile holding the starting coin grant.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn update_location(
        &self,
        id: &str,
        continent: Option<String>,
        country: Option<String>,
    ) -> Result<Option<User>, AppError>;

    /// Adds `score` to the lifetime total and bumps `quizzes_completed`.
    async fn add_quiz_totals(&self, id: &str, score: i32) -> Result<Option<User>, AppError>;

    /// Returns the new balance, or `None` for an unknown user.
    async fn credit_coins(&self, id: &str, amount: i32) -> Result<Option<i32>, AppError>;

    /// Check-and-decrement as one atomic step.
    async fn debit_coins(&self, id: &str, amount: i32) -> Result<DebitOutcome, AppError>;

    // Questions

    async fn count_questions(&self, category: Category) -> Result<i64, AppError>;

    /// Uniform random draw without replacement, in random order.
    async fn sample_questions(&self, category: Category, limit: i64) -> Result<Vec<Question>, AppError>;

    /// Appends questions, skipping any whose (category, text) already exists.
    /// Returns the number actually inserted.
    async fn insert_questions(&self, questions: Vec<NewQuestion>) -> Result<u64, AppError>;

    // Quiz sessions

    async fn create_session(
        &self,
        user_id: &str,
        category: Category,
        question_ids: &[i64],
    ) -> Result<QuizSession, AppError>;

    async fn get_session(&self, id: i64) -> Result<Option<QuizSession>, AppError>;

    async fn session_question(&self, session_id: i64, index: i32) -> Result<Option<Question>, AppError>;

    /// Advances the pointer only if it still equals `index` and the session is open.
    async fn record_answer(
        &self,
        session_id: i64,
        index: i32,
        points: i32,
        correct: bool,
    ) -> Result<Option<QuizSession>, AppError>;

    /// One-time terminal transition with authoritative final tallies.
    async fn complete_session(
        &self,
        id: i64,
        score: i32,
        correct_answers: i32,
    ) -> Result<CompleteWrite, AppError>;

    // Leaderboard

    /// Inserts an entry and recomputes ranks for its whole partition, serialized per partition.
    async fn insert_leaderboard_entry(
        &self,
        user_id: &str,
        session_id: i64,
        category: Category,
        score: i32,
        date: NaiveDate,
    ) -> Result<LeaderboardEntry, AppError>;

    async fn query_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardRow>, AppError>;

    /// Best rank of the user in the partition, if any.
    async fn rank_of(
        &self,
        user_id: &str,
        category: Category,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError>;
}
