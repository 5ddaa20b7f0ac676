// src/services/question_bank.rs

use std::sync::Arc;

use crate::{
    config::{LOW_STOCK_MARGIN, REPLENISH_BATCH_SIZE, SEED_THRESHOLD},
    error::AppError,
    models::{
        category::Category,
        question::{NewQuestion, Question, normalize_answer},
    },
    services::{
        seed,
        trivia::{RawQuestion, TriviaSource},
    },
    store::{DynStore, Store},
};

/// Category-grouped question stock with on-demand replenishment.
pub struct QuestionBank {
    store: DynStore,
    source: Arc<dyn TriviaSource>,
    low_stock_margin: i64,
    batch_size: u32,
}

impl QuestionBank {
    pub fn new(store: DynStore, source: Arc<dyn TriviaSource>) -> Self {
        Self {
            store,
            source,
            low_stock_margin: LOW_STOCK_MARGIN,
            batch_size: REPLENISH_BATCH_SIZE,
        }
    }

    pub async fn count_for(&self, category: Category) -> Result<i64, AppError> {
        self.store.count_questions(category).await
    }

    /// Draws up to `count` random questions, replenishing first when stock is
    /// within the margin of the request. A short list is a normal result.
    pub async fn sample(&self, category: Category, count: i64) -> Result<Vec<Question>, AppError> {
        let stock = self.count_for(category).await?;
        if stock < count + self.low_stock_margin {
            tracing::info!(
                "Low stock for {} ({} questions, {} requested), replenishing",
                category,
                stock,
                count
            );
            self.replenish(category).await;
        }

        self.store.sample_questions(category, count).await
    }

    /// Fetches and appends a batch. Upstream or storage failures are logged and
    /// reported as zero additions; they never reach the caller.
    pub async fn replenish(&self, category: Category) -> u64 {
        let raw = match self.source.fetch(category, self.batch_size).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Replenishment for {} skipped: {}", category, e);
                return 0;
            }
        };

        let fresh: Vec<NewQuestion> = raw.iter().filter_map(|q| normalize(category, q)).collect();

        match self.store.insert_questions(fresh).await {
            Ok(added) => {
                tracing::info!("Added {} questions to {}", added, category);
                added
            }
            Err(e) => {
                tracing::warn!("Storing replenished {} questions failed: {}", category, e);
                0
            }
        }
    }

    /// Startup pass: top up thin categories, then fall back to the built-in set.
    pub async fn seed(&self) -> Result<(), AppError> {
        for category in Category::ALL {
            if self.count_for(category).await? >= SEED_THRESHOLD {
                continue;
            }

            self.replenish(category).await;

            if self.count_for(category).await? == 0 {
                let added = self.store.insert_questions(seed::fallback_questions(category)).await?;
                tracing::info!("Seeded {} built-in questions for {}", added, category);
            }
        }
        Ok(())
    }
}

fn difficulty_level(label: &str) -> i16 {
    match label {
        "easy" => 2,
        "medium" => 3,
        "hard" => 4,
        _ => 3,
    }
}

/// Decodes HTML entities, upper-cases the answer and derives the length hint.
fn normalize(category: Category, raw: &RawQuestion) -> Option<NewQuestion> {
    let text = html_escape::decode_html_entities(&raw.text).trim().to_string();
    let answer = normalize_answer(&html_escape::decode_html_entities(&raw.answer));

    if text.is_empty() || answer.is_empty() {
        return None;
    }

    let hint = format!("This answer has {} characters", answer.chars().count());
    Some(NewQuestion {
        text,
        answer,
        category,
        difficulty: difficulty_level(&raw.difficulty),
        hint: Some(hint),
    })
}
