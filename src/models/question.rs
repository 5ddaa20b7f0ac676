// src/models/question.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::category::Category;

/// An immutable quiz item from the question bank.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,

    pub text: String,

    /// Canonical answer, stored upper-cased.
    pub answer: String,

    pub category: Category,

    /// 1 (easiest) to 5.
    pub difficulty: i16,

    pub hint: Option<String>,
}

impl Question {
    /// Case-insensitive, whitespace-trimmed exact match.
    pub fn is_correct(&self, provided: &str) -> bool {
        normalize_answer(provided) == normalize_answer(&self.answer)
    }

    /// Upper-cased character at `index`, counted in chars rather than bytes.
    pub fn answer_char(&self, index: usize) -> Option<char> {
        normalize_answer(&self.answer).chars().nth(index)
    }

    pub fn answer_len(&self) -> usize {
        normalize_answer(&self.answer).chars().count()
    }
}

pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Question content ready to be appended to stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub text: String,
    pub answer: String,
    pub category: Category,
    pub difficulty: i16,
    pub hint: Option<String>,
}

/// DTO for sending a question to the client (answer withheld).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub category: Category,
    pub difficulty: i16,
    pub hint: Option<String>,
    /// Number of characters in the answer, for rendering reveal slots.
    pub answer_length: usize,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            category: q.category,
            difficulty: q.difficulty,
            hint: q.hint.clone(),
            answer_length: q.answer_len(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RandomQuestionsQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital() -> Question {
        Question {
            id: 1,
            text: "What is the capital city of Australia?".to_string(),
            answer: "CANBERRA".to_string(),
            category: Category::Geography,
            difficulty: 3,
            hint: None,
        }
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        let q = capital();
        assert!(q.is_correct(" canberra "));
        assert!(q.is_correct("CanBerra"));
        assert!(!q.is_correct("can berra"));
        assert!(!q.is_correct("Sydney"));
    }

    #[test]
    fn answer_chars_are_upper_cased() {
        let q = Question {
            answer: "Zürich".to_string(),
            ..capital()
        };
        assert_eq!(q.answer_char(1), Some('Ü'));
        assert_eq!(q.answer_len(), 6);
        assert_eq!(q.answer_char(6), None);
    }
}
