// src/services/quiz.rs

use std::sync::Arc;

use crate::{
    config::POINTS_PER_CORRECT_ANSWER,
    error::AppError,
    models::{
        category::Category,
        question::{PublicQuestion, Question},
        quiz_session::{
            AnswerResult, CompleteSessionRequest, CompleteWrite, CompletionOutcome, QuizSession,
            SessionWithQuestions, UnlockResult,
        },
    },
    services::{
        leaderboard::{Leaderboard, today},
        ledger::Ledger,
        question_bank::QuestionBank,
    },
    store::{DynStore, Store},
};

/// Quiz session lifecycle: `create` → answers → one terminal `complete`.
pub struct QuizService {
    store: DynStore,
    bank: Arc<QuestionBank>,
    ledger: Ledger,
    leaderboard: Leaderboard,
}

impl QuizService {
    pub fn new(store: DynStore, bank: Arc<QuestionBank>) -> Self {
        Self {
            ledger: Ledger::new(store.clone()),
            leaderboard: Leaderboard::new(store.clone()),
            store,
            bank,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Loads a session owned by `user_id`. Sessions of other users read as missing.
    pub async fn owned_session(&self, user_id: &str, session_id: i64) -> Result<QuizSession, AppError> {
        self.store
            .get_session(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
    }

    async fn session_question(&self, session: &QuizSession, index: i32) -> Result<Question, AppError> {
        if index < 0 || index >= session.total_questions {
            return Err(AppError::BadRequest(format!(
                "Question index {} is outside the session (0..{})",
                index, session.total_questions
            )));
        }
        self.store
            .session_question(session.id, index)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    pub async fn create(
        &self,
        user_id: &str,
        category: Category,
        total_questions: i64,
    ) -> Result<SessionWithQuestions, AppError> {
        // Checked before sampling, which may call the trivia source.
        if self.store.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let questions = self.bank.sample(category, total_questions).await?;
        if questions.is_empty() {
            return Err(AppError::NotFound(format!("No questions available for {}", category)));
        }
        if (questions.len() as i64) < total_questions {
            tracing::warn!(
                "Short sample for {}: {} of {} questions",
                category,
                questions.len(),
                total_questions
            );
        }

        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        let session = self.store.create_session(user_id, category, &ids).await?;

        Ok(SessionWithQuestions {
            session,
            questions: questions.iter().map(PublicQuestion::from).collect(),
        })
    }

    /// Grades the answer at the session pointer and advances it.
    pub async fn submit_answer(
        &self,
        user_id: &str,
        session_id: i64,
        question_index: i32,
        provided: &str,
    ) -> Result<AnswerResult, AppError> {
        let session = self.owned_session(user_id, session_id).await?;
        if session.is_completed {
            return Err(AppError::Conflict("Session already completed".to_string()));
        }
        if question_index < session.current_index {
            return Err(AppError::Conflict(format!(
                "Question {} was already answered",
                question_index
            )));
        }
        if question_index > session.current_index {
            return Err(AppError::BadRequest(format!(
                "Answer question {} first",
                session.current_index
            )));
        }

        let question = self.session_question(&session, question_index).await?;
        let correct = question.is_correct(provided);
        let points = if correct { POINTS_PER_CORRECT_ANSWER } else { 0 };

        let session = self
            .store
            .record_answer(session_id, question_index, points, correct)
            .await?
            .ok_or_else(|| AppError::Conflict("Session changed concurrently, reload it".to_string()))?;

        Ok(AnswerResult {
            correct,
            points_awarded: points,
            correct_answer: question.answer,
            session,
        })
    }

    /// Spends one coin to reveal a character of a question in an open session.
    pub async fn unlock_character(
        &self,
        user_id: &str,
        session_id: i64,
        question_index: i32,
        character_index: i32,
    ) -> Result<UnlockResult, AppError> {
        let session = self.owned_session(user_id, session_id).await?;
        if session.is_completed {
            return Err(AppError::Conflict("Session already completed".to_string()));
        }

        let question = self.session_question(&session, question_index).await?;
        let index = usize::try_from(character_index)
            .map_err(|_| AppError::BadRequest("Character index must not be negative".to_string()))?;
        let reveal = self.ledger.unlock_character(user_id, &question, index).await?;

        Ok(UnlockResult {
            character: reveal.character.to_string(),
            character_index,
            remaining_coins: reveal.balance,
        })
    }

    /// Terminal transition. The session write is authoritative; the profile and
    /// leaderboard updates that follow are best-effort and reported as warnings.
    pub async fn complete(
        &self,
        user_id: &str,
        session_id: i64,
        req: &CompleteSessionRequest,
    ) -> Result<CompletionOutcome, AppError> {
        let session = self.owned_session(user_id, session_id).await?;
        if session.is_completed {
            return Err(AppError::Conflict("Session already completed".to_string()));
        }

        let (score, correct_answers) = final_tallies(&session, req)?;

        let session = match self.store.complete_session(session_id, score, correct_answers).await? {
            CompleteWrite::Completed(session) => session,
            CompleteWrite::AlreadyCompleted => {
                return Err(AppError::Conflict("Session already completed".to_string()));
            }
            CompleteWrite::NotFound => return Err(AppError::NotFound("Session not found".to_string())),
        };

        let mut warnings = Vec::new();

        match self.store.add_quiz_totals(user_id, score).await {
            Ok(Some(_)) => {}
            Ok(None) => warnings.push("Profile not found, lifetime totals not updated".to_string()),
            Err(e) => {
                tracing::warn!("Totals update failed for session {}: {}", session_id, e);
                warnings.push("Lifetime totals could not be updated".to_string());
            }
        }

        let leaderboard_entry = match self
            .leaderboard
            .record_completion(user_id, session_id, session.category, score, today())
            .await
        {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Leaderboard insert failed for session {}: {}", session_id, e);
                warnings.push("Leaderboard entry could not be recorded".to_string());
                None
            }
        };

        Ok(CompletionOutcome {
            session,
            leaderboard_entry,
            warnings,
        })
    }
}

/// Picks the authoritative final tallies and checks they are consistent.
fn final_tallies(session: &QuizSession, req: &CompleteSessionRequest) -> Result<(i32, i32), AppError> {
    let correct_answers = req.correct_answers.unwrap_or(session.correct_answers);
    if !(0..=session.total_questions).contains(&correct_answers) {
        return Err(AppError::BadRequest(format!(
            "correct_answers must be between 0 and {}",
            session.total_questions
        )));
    }

    // Bounded by the session length, so this cannot overflow.
    let expected = correct_answers * POINTS_PER_CORRECT_ANSWER;
    let score = req.score.unwrap_or(expected);
    if score != expected {
        return Err(AppError::BadRequest(format!(
            "score must equal correct_answers x {}",
            POINTS_PER_CORRECT_ANSWER
        )));
    }
    Ok((score, correct_answers))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        models::{
            coins::DebitOutcome,
            leaderboard::{LeaderboardEntry, LeaderboardFilter, LeaderboardRow},
            question::NewQuestion,
            user::{NewUser, User},
        },
        services::trivia::{RawQuestion, TriviaSource, TriviaSourceError},
        store::MemoryStore,
    };

    struct NoSource;

    #[async_trait]
    impl TriviaSource for NoSource {
        async fn fetch(&self, _category: Category, _amount: u32) -> Result<Vec<RawQuestion>, TriviaSourceError> {
            Err(TriviaSourceError::Status(503))
        }
    }

    async fn service() -> (QuizService, DynStore) {
        service_over(Arc::new(MemoryStore::new())).await
    }

    /// Seeds `alice` and two Geography questions into `store`.
    async fn service_over(store: DynStore) -> (QuizService, DynStore) {
        store
            .create_user(NewUser {
                id: "alice".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                continent: Some("Oceania".to_string()),
                country: Some("Australia".to_string()),
            })
            .await
            .unwrap();
        store
            .insert_questions(vec![
                NewQuestion {
                    text: "What is the capital city of Australia?".to_string(),
                    answer: "CANBERRA".to_string(),
                    category: Category::Geography,
                    difficulty: 3,
                    hint: None,
                },
                NewQuestion {
                    text: "What is the largest ocean on Earth?".to_string(),
                    answer: "PACIFIC".to_string(),
                    category: Category::Geography,
                    difficulty: 2,
                    hint: None,
                },
            ])
            .await
            .unwrap();

        let bank = Arc::new(QuestionBank::new(store.clone(), Arc::new(NoSource)));
        (QuizService::new(store.clone(), bank), store)
    }

    async fn answer_for(store: &DynStore, session_id: i64, index: i32) -> String {
        store.session_question(session_id, index).await.unwrap().unwrap().answer
    }

    #[tokio::test]
    async fn short_sample_shrinks_the_session() {
        let (quiz, _) = service().await;
        let created = quiz.create("alice", Category::Geography, 10).await.unwrap();
        assert_eq!(created.session.total_questions, 2);
        assert_eq!(created.questions.len(), 2);
    }

    #[tokio::test]
    async fn empty_category_cannot_start() {
        let (quiz, _) = service().await;
        assert!(matches!(
            quiz.create("alice", Category::Arts, 5).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn full_round_updates_profile_and_leaderboard() {
        let (quiz, store) = service().await;
        let id = quiz.create("alice", Category::Geography, 2).await.unwrap().session.id;

        let first = answer_for(&store, id, 0).await;
        let graded = quiz
            .submit_answer("alice", id, 0, &format!("  {}  ", first.to_lowercase()))
            .await
            .unwrap();
        assert!(graded.correct);
        assert_eq!(graded.points_awarded, 100);

        let graded = quiz.submit_answer("alice", id, 1, "atlantis").await.unwrap();
        assert!(!graded.correct);
        assert_eq!(graded.session.score, 100);

        let outcome = quiz
            .complete("alice", id, &CompleteSessionRequest::default())
            .await
            .unwrap();
        assert!(!outcome.is_partial());
        assert!(outcome.session.is_completed);
        assert_eq!(outcome.session.score, 100);
        assert_eq!(outcome.leaderboard_entry.unwrap().rank, 1);

        let alice = store.get_user("alice").await.unwrap().unwrap();
        assert_eq!(alice.total_score, 100);
        assert_eq!(alice.quizzes_completed, 1);
    }

    #[tokio::test]
    async fn completing_twice_counts_once() {
        let (quiz, store) = service().await;
        let id = quiz.create("alice", Category::Geography, 2).await.unwrap().session.id;
        let req = CompleteSessionRequest {
            score: Some(200),
            correct_answers: Some(2),
        };

        quiz.complete("alice", id, &req).await.unwrap();
        assert!(matches!(
            quiz.complete("alice", id, &req).await,
            Err(AppError::Conflict(_))
        ));

        let alice = store.get_user("alice").await.unwrap().unwrap();
        assert_eq!(alice.total_score, 200);
        assert_eq!(alice.quizzes_completed, 1);

        let rows = quiz
            .leaderboard()
            .query(&LeaderboardFilter {
                limit: 100,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn inconsistent_final_tallies_are_rejected() {
        let (quiz, _) = service().await;
        let id = quiz.create("alice", Category::Geography, 2).await.unwrap().session.id;

        let too_many = CompleteSessionRequest {
            score: Some(300),
            correct_answers: Some(3),
        };
        assert!(matches!(
            quiz.complete("alice", id, &too_many).await,
            Err(AppError::BadRequest(_))
        ));

        let mismatched = CompleteSessionRequest {
            score: Some(150),
            correct_answers: Some(1),
        };
        assert!(matches!(
            quiz.complete("alice", id, &mismatched).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn answers_must_follow_the_pointer() {
        let (quiz, _) = service().await;
        let id = quiz.create("alice", Category::Geography, 2).await.unwrap().session.id;

        assert!(matches!(
            quiz.submit_answer("alice", id, 1, "x").await,
            Err(AppError::BadRequest(_))
        ));
        quiz.submit_answer("alice", id, 0, "x").await.unwrap();
        assert!(matches!(
            quiz.submit_answer("alice", id, 0, "x").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn other_users_sessions_are_invisible() {
        let (quiz, _) = service().await;
        let id = quiz.create("alice", Category::Geography, 1).await.unwrap().session.id;
        assert!(matches!(
            quiz.submit_answer("mallory", id, 0, "x").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unlocks_reveal_session_answers() {
        let (quiz, store) = service().await;
        let id = quiz.create("alice", Category::Geography, 2).await.unwrap().session.id;
        let answer = answer_for(&store, id, 1).await;

        let unlocked = quiz.unlock_character("alice", id, 1, 0).await.unwrap();
        assert_eq!(unlocked.character, answer[..1].to_string());
        assert_eq!(unlocked.remaining_coins, 9);

        quiz.complete("alice", id, &CompleteSessionRequest::default())
            .await
            .unwrap();
        assert!(matches!(
            quiz.unlock_character("alice", id, 1, 1).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(store.get_user("alice").await.unwrap().unwrap().coins, 9);
    }

    #[test]
    fn oversized_correct_answers_are_rejected_without_overflow() {
        let session = QuizSession {
            id: 1,
            user_id: "alice".to_string(),
            category: Category::Geography,
            total_questions: 2,
            current_index: 0,
            score: 0,
            correct_answers: 0,
            is_completed: false,
            created_at: None,
            completed_at: None,
        };
        for req in [
            CompleteSessionRequest {
                score: None,
                correct_answers: Some(i32::MAX),
            },
            CompleteSessionRequest {
                score: Some(i32::MAX),
                correct_answers: Some(i32::MAX),
            },
        ] {
            assert!(matches!(final_tallies(&session, &req), Err(AppError::BadRequest(_))));
        }
    }

    struct CountingSource(AtomicUsize);

    #[async_trait]
    impl TriviaSource for CountingSource {
        async fn fetch(&self, _category: Category, _amount: u32) -> Result<Vec<RawQuestion>, TriviaSourceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn unknown_user_cannot_start_and_nothing_is_fetched() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let bank = Arc::new(QuestionBank::new(store.clone(), source.clone()));
        let quiz = QuizService::new(store, bank);

        assert!(matches!(
            quiz.create("ghost", Category::History, 5).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(source.0.load(Ordering::SeqCst), 0);
    }

    /// Delegates to a `MemoryStore` but fails the chosen follow-up writes.
    struct FailingSideEffects {
        inner: MemoryStore,
        fail_totals: bool,
        fail_leaderboard: bool,
    }

    fn store_down() -> AppError {
        AppError::InternalServerError("connection reset".to_string())
    }

    #[async_trait]
    impl Store for FailingSideEffects {
        async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
            self.inner.create_user(new_user).await
        }

        async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
            self.inner.get_user(id).await
        }

        async fn update_location(
            &self,
            id: &str,
            continent: Option<String>,
            country: Option<String>,
        ) -> Result<Option<User>, AppError> {
            self.inner.update_location(id, continent, country).await
        }

        async fn add_quiz_totals(&self, id: &str, score: i32) -> Result<Option<User>, AppError> {
            if self.fail_totals {
                return Err(store_down());
            }
            self.inner.add_quiz_totals(id, score).await
        }

        async fn credit_coins(&self, id: &str, amount: i32) -> Result<Option<i32>, AppError> {
            self.inner.credit_coins(id, amount).await
        }

        async fn debit_coins(&self, id: &str, amount: i32) -> Result<DebitOutcome, AppError> {
            self.inner.debit_coins(id, amount).await
        }

        async fn count_questions(&self, category: Category) -> Result<i64, AppError> {
            self.inner.count_questions(category).await
        }

        async fn sample_questions(&self, category: Category, limit: i64) -> Result<Vec<Question>, AppError> {
            self.inner.sample_questions(category, limit).await
        }

        async fn insert_questions(&self, questions: Vec<NewQuestion>) -> Result<u64, AppError> {
            self.inner.insert_questions(questions).await
        }

        async fn create_session(
            &self,
            user_id: &str,
            category: Category,
            question_ids: &[i64],
        ) -> Result<QuizSession, AppError> {
            self.inner.create_session(user_id, category, question_ids).await
        }

        async fn get_session(&self, id: i64) -> Result<Option<QuizSession>, AppError> {
            self.inner.get_session(id).await
        }

        async fn session_question(&self, session_id: i64, index: i32) -> Result<Option<Question>, AppError> {
            self.inner.session_question(session_id, index).await
        }

        async fn record_answer(
            &self,
            session_id: i64,
            index: i32,
            points: i32,
            correct: bool,
        ) -> Result<Option<QuizSession>, AppError> {
            self.inner.record_answer(session_id, index, points, correct).await
        }

        async fn complete_session(
            &self,
            id: i64,
            score: i32,
            correct_answers: i32,
        ) -> Result<CompleteWrite, AppError> {
            self.inner.complete_session(id, score, correct_answers).await
        }

        async fn insert_leaderboard_entry(
            &self,
            user_id: &str,
            session_id: i64,
            category: Category,
            score: i32,
            date: NaiveDate,
        ) -> Result<LeaderboardEntry, AppError> {
            if self.fail_leaderboard {
                return Err(store_down());
            }
            self.inner
                .insert_leaderboard_entry(user_id, session_id, category, score, date)
                .await
        }

        async fn query_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardRow>, AppError> {
            self.inner.query_leaderboard(filter).await
        }

        async fn rank_of(
            &self,
            user_id: &str,
            category: Category,
            date: NaiveDate,
        ) -> Result<Option<i32>, AppError> {
            self.inner.rank_of(user_id, category, date).await
        }
    }

    async fn partial_completion(fail_totals: bool, fail_leaderboard: bool) -> (QuizService, CompletionOutcome) {
        let store: DynStore = Arc::new(FailingSideEffects {
            inner: MemoryStore::new(),
            fail_totals,
            fail_leaderboard,
        });
        let (quiz, _) = service_over(store).await;
        let id = quiz.create("alice", Category::Geography, 2).await.unwrap().session.id;
        let outcome = quiz
            .complete("alice", id, &CompleteSessionRequest::default())
            .await
            .unwrap();

        assert!(outcome.session.is_completed);
        assert!(outcome.is_partial());
        assert!(!outcome.warnings.is_empty());
        assert!(matches!(
            quiz.complete("alice", id, &CompleteSessionRequest::default()).await,
            Err(AppError::Conflict(_))
        ));
        (quiz, outcome)
    }

    #[tokio::test]
    async fn failed_leaderboard_write_is_a_partial_success() {
        let (quiz, outcome) = partial_completion(false, true).await;
        assert!(outcome.leaderboard_entry.is_none());
        assert_eq!(outcome.warnings.len(), 1);

        let rows = quiz
            .leaderboard()
            .query(&LeaderboardFilter {
                limit: 100,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn failed_totals_update_is_a_partial_success() {
        let (_, outcome) = partial_completion(true, false).await;
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.leaderboard_entry.unwrap().rank, 1);
    }
}
