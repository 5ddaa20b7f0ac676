// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

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
    store::{Store, memory::balance_overflow},
};

const USER_COLUMNS: &str =
    "id, username, email, continent, country, total_score, quizzes_completed, coins, created_at";

const SESSION_COLUMNS: &str = "id, user_id, category, total_questions, current_index, score, \
     correct_answers, is_completed, created_at, completed_at";

const ENTRY_COLUMNS: &str = "id, user_id, session_id, score, category, entry_date, rank";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Helper struct for rows whose `category` column needs parsing.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    text: String,
    answer: String,
    category: String,
    difficulty: i16,
    hint: Option<String>,
}

#[derive(FromRow)]
struct SessionRow {
    id: i64,
    user_id: String,
    category: String,
    total_questions: i32,
    current_index: i32,
    score: i32,
    correct_answers: i32,
    is_completed: bool,
    created_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct EntryRow {
    id: i64,
    user_id: String,
    session_id: i64,
    score: i32,
    category: String,
    entry_date: NaiveDate,
    rank: i32,
}

#[derive(FromRow)]
struct JoinedEntryRow {
    #[sqlx(flatten)]
    entry: EntryRow,
    username: String,
    country: Option<String>,
    continent: Option<String>,
}

fn stored_category(raw: &str) -> Result<Category, AppError> {
    raw.parse()
        .map_err(|_| AppError::InternalServerError(format!("Corrupt category '{}' in store", raw)))
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            text: row.text,
            answer: row.answer,
            category: stored_category(&row.category)?,
            difficulty: row.difficulty,
            hint: row.hint,
        })
    }
}

impl TryFrom<SessionRow> for QuizSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(QuizSession {
            id: row.id,
            user_id: row.user_id,
            category: stored_category(&row.category)?,
            total_questions: row.total_questions,
            current_index: row.current_index,
            score: row.score,
            correct_answers: row.correct_answers,
            is_completed: row.is_completed,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

impl TryFrom<EntryRow> for LeaderboardEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(LeaderboardEntry {
            id: row.id,
            user_id: row.user_id,
            session_id: row.session_id,
            score: row.score,
            category: stored_category(&row.category)?,
            entry_date: row.entry_date,
            rank: row.rank,
        })
    }
}

/// SQLSTATE 22003 `numeric_value_out_of_range`.
fn out_of_range(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "22003")
}

fn unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, username, email, continent, country, coins) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.id)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.continent)
            .bind(&new_user.country)
            .bind(STARTING_COINS)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    AppError::Conflict(format!(
                        "Profile, username '{}' or email already exists",
                        new_user.username
                    ))
                } else {
                    tracing::error!("Failed to create user: {:?}", e);
                    AppError::from(e)
                }
            })
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_location(
        &self,
        id: &str,
        continent: Option<String>,
        country: Option<String>,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET continent = COALESCE($2, continent), country = COALESCE($3, country) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(continent)
            .bind(country)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn add_quiz_totals(&self, id: &str, score: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET total_score = total_score + $2, quizzes_completed = quizzes_completed + 1 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(i64::from(score))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn credit_coins(&self, id: &str, amount: i32) -> Result<Option<i32>, AppError> {
        sqlx::query_scalar::<_, i32>("UPDATE users SET coins = coins + $2 WHERE id = $1 RETURNING coins")
            .bind(id)
            .bind(amount)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if out_of_range(&e) {
                    balance_overflow(id)
                } else {
                    AppError::from(e)
                }
            })
    }

    async fn debit_coins(&self, id: &str, amount: i32) -> Result<DebitOutcome, AppError> {
        // The balance check lives in the WHERE clause, so the row lock makes it one step.
        let debited = sqlx::query_scalar::<_, i32>(
            "UPDATE users SET coins = GREATEST(coins - $2, 0) \
             WHERE id = $1 AND coins >= $2 RETURNING coins",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(balance) = debited {
            return Ok(DebitOutcome::Debited { balance });
        }

        let balance = sqlx::query_scalar::<_, i32>("SELECT coins FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match balance {
            Some(balance) => DebitOutcome::Insufficient { balance },
            None => DebitOutcome::UnknownUser,
        })
    }

    async fn count_questions(&self, category: Category) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE category = $1")
            .bind(category.as_str())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn sample_questions(&self, category: Category, limit: i64) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, text, answer, category, difficulty, hint
            FROM questions
            WHERE category = $1
            ORDER BY RANDOM()
            LIMIT $2
            "#,
        )
        .bind(category.as_str())
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to sample questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert_questions(&self, questions: Vec<NewQuestion>) -> Result<u64, AppError> {
        if questions.is_empty() {
            return Ok(0);
        }

        let mut query_builder =
            QueryBuilder::<Postgres>::new("INSERT INTO questions (text, answer, category, difficulty, hint) ");
        query_builder.push_values(&questions, |mut row, q| {
            row.push_bind(&q.text)
                .push_bind(&q.answer)
                .push_bind(q.category.as_str())
                .push_bind(q.difficulty)
                .push_bind(&q.hint);
        });
        query_builder.push(" ON CONFLICT (category, text) DO NOTHING");

        let result = query_builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn create_session(
        &self,
        user_id: &str,
        category: Category,
        question_ids: &[i64],
    ) -> Result<QuizSession, AppError> {
        let mut tx = self.pool.begin().await?;

        let user_exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let sql = format!(
            "INSERT INTO quiz_sessions (user_id, category, total_questions) \
             VALUES ($1, $2, $3) RETURNING {SESSION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(user_id)
            .bind(category.as_str())
            .bind(question_ids.len() as i32)
            .fetch_one(&mut *tx)
            .await?;

        if !question_ids.is_empty() {
            let mut query_builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO quiz_session_questions (session_id, position, question_id) ",
            );
            query_builder.push_values(question_ids.iter().zip(0i32..), |mut b, (question_id, position)| {
                b.push_bind(row.id).push_bind(position).push_bind(*question_id);
            });
            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        QuizSession::try_from(row)
    }

    async fn get_session(&self, id: i64) -> Result<Option<QuizSession>, AppError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM quiz_sessions WHERE id = $1");
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(QuizSession::try_from)
            .transpose()
    }

    async fn session_question(&self, session_id: i64, index: i32) -> Result<Option<Question>, AppError> {
        sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT q.id, q.text, q.answer, q.category, q.difficulty, q.hint
            FROM quiz_session_questions sq
            JOIN questions q ON q.id = sq.question_id
            WHERE sq.session_id = $1 AND sq.position = $2
            "#,
        )
        .bind(session_id)
        .bind(index)
        .fetch_optional(&self.pool)
        .await?
        .map(Question::try_from)
        .transpose()
    }

    async fn record_answer(
        &self,
        session_id: i64,
        index: i32,
        points: i32,
        correct: bool,
    ) -> Result<Option<QuizSession>, AppError> {
        let sql = format!(
            "UPDATE quiz_sessions \
             SET current_index = current_index + 1, score = score + $3, correct_answers = correct_answers + $4 \
             WHERE id = $1 AND current_index = $2 AND is_completed = FALSE \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(session_id)
            .bind(index)
            .bind(points)
            .bind(i32::from(correct))
            .fetch_optional(&self.pool)
            .await?
            .map(QuizSession::try_from)
            .transpose()
    }

    async fn complete_session(
        &self,
        id: i64,
        score: i32,
        correct_answers: i32,
    ) -> Result<CompleteWrite, AppError> {
        let sql = format!(
            "UPDATE quiz_sessions \
             SET is_completed = TRUE, score = $2, correct_answers = $3, completed_at = NOW() \
             WHERE id = $1 AND is_completed = FALSE \
             RETURNING {SESSION_COLUMNS}"
        );
        let completed = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id)
            .bind(score)
            .bind(correct_answers)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = completed {
            return Ok(CompleteWrite::Completed(QuizSession::try_from(row)?));
        }

        let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM quiz_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(if exists.is_some() {
            CompleteWrite::AlreadyCompleted
        } else {
            CompleteWrite::NotFound
        })
    }

    async fn insert_leaderboard_entry(
        &self,
        user_id: &str,
        session_id: i64,
        category: Category,
        score: i32,
        date: NaiveDate,
    ) -> Result<LeaderboardEntry, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializes writers of this (category, date) partition until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
            .bind(category.as_str())
            .bind(date.to_string())
            .execute(&mut *tx)
            .await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO leaderboard_entries (user_id, session_id, score, category, entry_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(score)
        .bind(category.as_str())
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation(&e) {
                AppError::Conflict(format!("Session {} already has a leaderboard entry", session_id))
            } else {
                AppError::from(e)
            }
        })?;

        sqlx::query(
            r#"
            UPDATE leaderboard_entries AS le
            SET rank = ranked.position
            FROM (
                SELECT id, (ROW_NUMBER() OVER (ORDER BY score DESC, id ASC))::INTEGER AS position
                FROM leaderboard_entries
                WHERE category = $1 AND entry_date = $2
            ) AS ranked
            WHERE le.id = ranked.id AND le.rank <> ranked.position
            "#,
        )
        .bind(category.as_str())
        .bind(date)
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {ENTRY_COLUMNS} FROM leaderboard_entries WHERE id = $1");
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        LeaderboardEntry::try_from(row)
    }

    async fn query_leaderboard(&self, filter: &LeaderboardFilter) -> Result<Vec<LeaderboardRow>, AppError> {
        let rows = sqlx::query_as::<_, JoinedEntryRow>(
            r#"
            SELECT
                le.id, le.user_id, le.session_id, le.score, le.category, le.entry_date, le.rank,
                u.username, u.country, u.continent
            FROM leaderboard_entries le
            JOIN users u ON u.id = le.user_id
            WHERE ($1::TEXT IS NULL OR le.category = $1)
              AND ($2::TEXT IS NULL OR u.country = $2)
              AND ($3::TEXT IS NULL OR u.continent = $3)
              AND ($4::DATE IS NULL OR le.entry_date = $4)
            ORDER BY le.rank ASC, le.entry_date DESC, le.score DESC, le.id ASC
            LIMIT $5
            "#,
        )
        .bind(filter.category.map(Category::as_str))
        .bind(filter.country.as_deref())
        .bind(filter.continent.as_deref())
        .bind(filter.date)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(LeaderboardRow {
                    entry: LeaderboardEntry::try_from(row.entry)?,
                    user: LeaderboardOwner {
                        username: row.username,
                        country: row.country,
                        continent: row.continent,
                    },
                })
            })
            .collect()
    }

    async fn rank_of(
        &self,
        user_id: &str,
        category: Category,
        date: NaiveDate,
    ) -> Result<Option<i32>, AppError> {
        Ok(sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MIN(rank)
            FROM leaderboard_entries
            WHERE user_id = $1 AND category = $2 AND entry_date = $3
            "#,
        )
        .bind(user_id)
        .bind(category.as_str())
        .bind(date)
        .fetch_one(&self.pool)
        .await?)
    }
}
