// src/store/memory.rs

//! Non-durable store for local development and tests.
//!
//! All state sits behind one async mutex, so each trait call is atomic with
//! respect to every other call. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;

use crate::{
    config::STARTING_COINS,
    error::AppError,
    models::{
        category::Category,
        coins::DebitOutcome,
        leaderboard::{LeaderboardEntry, LeaderboardFilter, LeaderboardOwner, LeaderboardRow},
        question::{NewQuestion, Question},
        quiz_session::{CompleteWrite, QuizSession},
        user::{NewUser, User},
    },
    services::ranking::partition_ranks,
    store::Store,
};

struct StoredSession {
    session: QuizSession,
    question_ids: Vec<i64>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    questions: Vec<Question>,
    sessions: HashMap<i64, StoredSession>,
    entries: Vec<LeaderboardEntry>,
    next_question_id: i64,
    next_session_id: i64,
    next_entry_id: i64,
}

impl MemoryState {
    fn question(&self, id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    fn rerank(&mut self, category: Category, date: NaiveDate) {
        let ranks = partition_ranks(
            self.entries
                .iter()
                .filter(|e| e.category == category && e.entry_date == date)
                .map(|e| (e.id, e.score)),
        );
        let ranks: HashMap<i64, i32> = ranks.into_iter().collect();
        for entry in self.entries.iter_mut() {
            if let Some(rank) = ranks.get(&entry.id) {
                entry.rank = *rank;
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A credit that would push the balance past `i32::MAX`.
pub(crate) fn balance_overflow(id: &str) -> AppError {
    AppError::BadRequest(format!("Credit would exceed the maximum balance for {}", id))
}

fn shuffled_sample(mut pool: Vec<Question>, limit: usize) -> Vec<Question> {
    pool.shuffle(&mut rand::thread_rng());
    pool.truncate(limit);
    pool
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.lock().await;

        if state.users.contains_key(&new_user.id) {
            return Err(AppError::Conflict("Profile already exists".to_string()));
        }
        if state.users.values().any(|u| u.username == new_user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                new_user.username
            )));
        }
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict(format!("Email '{}' already exists", new_user.email)));
        }

        let user = User {
            id: new_user.id,
            username: new_user.username,
            email: new_user.email,
            continent: new_user.continent,
            country: new_user.country,
            total_score: 0,
            quizzes_completed: 0,
            coins: STARTING_COINS,
            created_at: Some(Utc::now()),
        };
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn update_location(
        &self,
        id: &str,
        continent: Option<String>,
        country: Option<String>,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(id).map(|user| {
            if continent.is_some() {
                user.continent = continent;
            }
            if country.is_some() {
                user.country = country;
            }
            user.clone()
        }))
    }

    async fn add_quiz_totals(&self, id: &str, score: i32) -> Result<Option<User>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(id).map(|user| {
            user.total_score += i64::from(score);
            user.quizzes_completed += 1;
            user.clone()
        }))
    }

    async fn credit_coins(&self, id: &str, amount: i32) -> Result<Option<i32>, AppError> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(id) else {
            return Ok(None);
        };
        user.coins = user
            .coins
            .checked_add(amount)
            .ok_or_else(|| balance_overflow(id))?;
        Ok(Some(user.coins))
    }

    async fn debit_coins(&self, id: &str, amount: i32) -> Result<DebitOutcome, AppError> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(id) else {
            return Ok(DebitOutcome::UnknownUser);
        };

        if user.coins < amount {
            return Ok(DebitOutcome::Insufficient { balance: user.coins });
        }
        user.coins = (user.coins - amount).max(0);
        Ok(DebitOutcome::Debited { balance: user.coins })
    }

    async fn count_questions(&self, category: Category) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state.questions.iter().filter(|q| q.category == category).count() as i64)
    }

    async fn sample_questions(&self, category: Category, limit: i64) -> Result<Vec<Question>, AppError> {
        let pool: Vec<Question> = {
            let state = self.state.lock().await;
            state
                .questions
                .iter()
                .filter(|q| q.category == category)
                .cloned()
                .collect()
        };
        Ok(shuffled_sample(pool, usize::try_from(limit).unwrap_or(0)))
    }

    async fn insert_questions(&self, questions: Vec<NewQuestion>) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let mut inserted = 0;

        for q in questions {
            let duplicate = state
                .questions
                .iter()
                .any(|existing| existing.category == q.category && existing.text == q.text);
            if duplicate {
                continue;
            }

            state.next_question_id += 1;
            let id = state.next_question_id;
            state.questions.push(Question {
                id,
                text: q.text,
                answer: q.answer,
                category: q.category,
                difficulty: q.difficulty,
                hint: q.hint,
            });
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn create_session(
        &self,
        user_id: &str,
        category: Category,
        question_ids: &[i64],
    ) -> Result<QuizSession, AppError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(user_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        state.next_session_id += 1;
        let session = QuizSession {
            id: state.next_session_id,
            user_id: user_id.to_string(),
            category,
            total_questions: question_ids.len() as i32,
            current_index: 0,
            score: 0,
            correct_answers: 0,
            is_completed: false,
            created_at: Some(Utc::now()),
            completed_at: None,
        };
        state.sessions.insert(
            session.id,
            StoredSession {
                session: session.clone(),
                question_ids: question_ids.to_vec(),
            },
        );
        Ok(session)
    }

    async fn get_session(&self, id: i64) -> Result<Option<QuizSession>, AppError> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(&id).map(|s| s.session.clone()))
    }

    async fn session_question(&self, session_id: i64, index: i32) -> Result<Option<Question>, AppError> {
        let state = self.state.lock().await;
        let question_id = state
            .sessions
            .get(&session_id)
            .and_then(|s| usize::try_from(index).ok().and_then(|i| s.question_ids.get(i)).copied());
        Ok(question_id.and_then(|id| state.question(id).cloned()))
    }

    async fn record_answer(
        &self,
        session_id: i64,
        index: i32,
        points: i32,
        correct: bool,
    ) -> Result<Option<QuizSession>, AppError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.sessions.get_mut(&session_id) else {
            return Ok(None);
        };
        let session = &mut stored.session;
        if session.is_completed || session.current_index != index {
            return Ok(None);
        }

        session.current_index += 1;
        session.score += points;
        if correct {
            session.correct_answers += 1;
        }
        Ok(Some(session.clone()))
    }

    async fn complete_session(
        &self,
        id: i64,
        score: i32,
        correct_answers: i32,
    ) -> Result<CompleteWrite, AppError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.sessions.get_mut(&id) else {
            return Ok(CompleteWrite::NotFound);
        };
        let session = &mut stored.session;
        if session.is_completed {
            return Ok(CompleteWrite::AlreadyCompleted);
        }

        session.score = score;
        session.correct_answers = correct_answers;
        session.is_completed = true;
        session.completed_at = Some(Utc::now());
        Ok(CompleteWrite::Completed(session.clone()))
    }

    async fn insert_leaderboard_entry(
        &self,
        user_id: &str,
        session_id: i64,
        category: Category,
        score: i32,
        date: NaiveDate,
    ) -> Result<LeaderboardEntry, AppError> {
        let mut state = self.state.lock().await;
        if state.entries.iter().any(|e| e.session_id == session_id) {
            return Err(AppError::Conflict(format!(
                "Session {} already has a leaderboard entry",
                session_id
            )));
        }

        state.next_entry_id += 1;
        let id = state.next_entry_id;
        state.entries.push(LeaderboardEntry {
            id,
            user_id: user_id.to_string(),
            session_id,
            score,
            category,
            entry_date: date,
            rank: 0,
        });
        state.rerank(category, date);

        state
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| AppError::InternalServerError("Leaderboard entry vanished".to_string()))
    }

    async fn query_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardRow>, AppError> {
        let state = self.state.lock().await;

        let mut rows: Vec<LeaderboardRow> = state
            .entries
            .iter()
            .filter(|e| filter.category.is_none_or(|c| e.category == c))
            .filter(|e| filter.date.is_none_or(|d| e.entry_date == d))
            .filter_map(|e| {
                let user = state.users.get(&e.user_id)?;
                if let Some(country) = &filter.country {
                    if user.country.as_ref() != Some(country) {
                        return None;
                    }
                }
                if let Some(continent) = &filter.continent {
                    if user.continent.as_ref() != Some(continent) {
                        return None;
                    }
                }
                Some(LeaderboardRow {
                    entry: e.clone(),
                    user: LeaderboardOwner {
                        username: user.username.clone(),
                        country: user.country.clone(),
                        continent: user.continent.clone(),
                    },
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.entry
                .rank
                .cmp(&b.entry.rank)
                .then(b.entry.entry_date.cmp(&a.entry.entry_date))
                .then(b.entry.score.cmp(&a.entry.score))
                .then(a.entry.id.cmp(&b.entry.id))
        });
        rows.truncate(usize::try_from(filter.limit).unwrap_or(0));
        Ok(rows)
    }

    async fn rank_of(
        &self,
        user_id: &str,
        category: Category,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.category == category && e.entry_date == date)
            .map(|e| e.rank)
            .min())
    }
}
