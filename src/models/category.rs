// src/models/category.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Closed set of quiz categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Geography,
    History,
    Science,
    Arts,
    Sports,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Geography,
        Category::History,
        Category::Science,
        Category::Arts,
        Category::Sports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Geography => "Geography",
            Category::History => "History",
            Category::Science => "Science",
            Category::Arts => "Arts",
            Category::Sports => "Sports",
        }
    }

    /// Open Trivia DB category id used when replenishing.
    pub fn opentdb_id(self) -> u32 {
        match self {
            Category::Geography => 22,
            Category::History => 23,
            Category::Science => 17,
            Category::Arts => 25,
            Category::Sports => 21,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown category '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("science".parse::<Category>().unwrap(), Category::Science);
        assert_eq!(" Arts ".parse::<Category>().unwrap(), Category::Arts);
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(matches!(
            "Cooking".parse::<Category>(),
            Err(AppError::BadRequest(_))
        ));
    }
}
