// src/services/trivia.rs

//! External trivia content source.
//!
//! The adapter owns transport only: query construction, timeout, HTTP status
//! mapping and JSON decoding. Normalization happens in the question bank.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::models::category::Category;

/// One question tuple as the upstream returns it (still HTML-escaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuestion {
    pub text: String,
    pub answer: String,
    pub difficulty: String,
}

#[derive(Debug, Error)]
pub enum TriviaSourceError {
    #[error("trivia source unreachable: {0}")]
    Transport(String),

    #[error("trivia source returned HTTP {0}")]
    Status(u16),

    #[error("trivia source returned response code {0}")]
    ResponseCode(u8),

    #[error("invalid trivia payload: {0}")]
    Decode(String),
}

#[async_trait]
pub trait TriviaSource: Send + Sync {
    async fn fetch(&self, category: Category, amount: u32) -> Result<Vec<RawQuestion>, TriviaSourceError>;
}

#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<OpenTdbQuestion>,
}

#[derive(Debug, Deserialize)]
struct OpenTdbQuestion {
    question: String,
    correct_answer: String,
    difficulty: String,
}

/// Open Trivia DB adapter. Each batch is split across medium and hard difficulties.
pub struct OpenTdbSource {
    client: Client,
    endpoint: Url,
}

impl OpenTdbSource {
    const DIFFICULTIES: [&'static str; 2] = ["medium", "hard"];

    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    async fn fetch_difficulty(
        &self,
        category: Category,
        amount: u32,
        difficulty: &str,
    ) -> Result<Vec<RawQuestion>, TriviaSourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("amount", amount.to_string()),
                ("category", category.opentdb_id().to_string()),
                ("difficulty", difficulty.to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()
            .await
            .map_err(|e| TriviaSourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriviaSourceError::Status(status.as_u16()));
        }

        let body: OpenTdbResponse = response
            .json()
            .await
            .map_err(|e| TriviaSourceError::Decode(e.to_string()))?;

        if body.response_code != 0 {
            return Err(TriviaSourceError::ResponseCode(body.response_code));
        }

        Ok(body
            .results
            .into_iter()
            .map(|q| RawQuestion {
                text: q.question,
                answer: q.correct_answer,
                difficulty: q.difficulty,
            })
            .collect())
    }
}

#[async_trait]
impl TriviaSource for OpenTdbSource {
    async fn fetch(&self, category: Category, amount: u32) -> Result<Vec<RawQuestion>, TriviaSourceError> {
        let per_difficulty = amount.div_ceil(Self::DIFFICULTIES.len() as u32);
        let mut collected = Vec::new();
        let mut last_error = None;

        for difficulty in Self::DIFFICULTIES {
            match self.fetch_difficulty(category, per_difficulty, difficulty).await {
                Ok(batch) => collected.extend(batch),
                Err(e) => {
                    tracing::warn!("Trivia fetch for {} ({}) failed: {}", category, difficulty, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if collected.is_empty() => Err(e),
            _ => {
                collected.truncate(amount as usize);
                Ok(collected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_opentdb_payload() {
        let body = r#"{
            "response_code": 0,
            "results": [{
                "type": "multiple",
                "difficulty": "hard",
                "category": "Science: Computers",
                "question": "What does &quot;CPU&quot; stand for?",
                "correct_answer": "Central Processing Unit",
                "incorrect_answers": ["a", "b", "c"]
            }]
        }"#;
        let decoded: OpenTdbResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.response_code, 0);
        assert_eq!(decoded.results.len(), 1);
        assert_eq!(decoded.results[0].difficulty, "hard");
    }

    #[test]
    fn empty_result_set_decodes() {
        let decoded: OpenTdbResponse = serde_json::from_str(r#"{"response_code": 1}"#).unwrap();
        assert_eq!(decoded.response_code, 1);
        assert!(decoded.results.is_empty());
    }

    #[tokio::test]
    async fn unreachable_source_is_an_error() {
        let source = OpenTdbSource::new(
            Url::parse("http://127.0.0.1:9/api.php").unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();
        let result = source.fetch(Category::Science, 4).await;
        assert!(matches!(result, Err(TriviaSourceError::Transport(_))));
    }
}
