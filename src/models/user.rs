// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{error::AppError, models::geo};

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_ ]+$").expect("username pattern is valid"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Subject id assigned by the identity provider.
    pub id: String,

    pub username: String,

    pub email: String,

    pub continent: Option<String>,

    pub country: Option<String>,

    /// Lifetime score. Only ever grows.
    pub total_score: i64,

    /// Lifetime count of completed quizzes. Only ever grows.
    pub quizzes_completed: i32,

    /// Coin balance. Never negative.
    pub coins: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating the caller's profile.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        length(
            min = 3,
            max = 30,
            message = "Username length must be between 3 and 30 characters."
        ),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may only contain letters, digits, spaces and underscores."
        )
    )]
    pub username: String,
    #[validate(email(message = "Email address is invalid."))]
    pub email: String,
    pub continent: Option<String>,
    pub country: Option<String>,
}

/// DTO for updating the caller's location. Score, coins and totals are not client-writable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    pub continent: Option<String>,
    pub country: Option<String>,
}

/// Validated profile data handed to the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub continent: Option<String>,
    pub country: Option<String>,
}

/// Checks a (continent, country) pair against the fixed enumeration.
pub fn validate_location(continent: Option<&str>, country: Option<&str>) -> Result<(), AppError> {
    if let Some(continent) = continent {
        if !geo::is_continent(continent) {
            return Err(AppError::BadRequest(format!("Unknown continent '{}'", continent)));
        }
    }

    if let Some(country) = country {
        let home = geo::continent_of(country)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown country '{}'", country)))?;

        if let Some(continent) = continent {
            if continent != home {
                return Err(AppError::BadRequest(format!(
                    "Country '{}' is not in {}",
                    country, continent
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_pairs() {
        assert!(validate_location(Some("Europe"), Some("France")).is_ok());
        assert!(validate_location(None, Some("Japan")).is_ok());
        assert!(validate_location(Some("Asia"), None).is_ok());
        assert!(validate_location(Some("Asia"), Some("France")).is_err());
        assert!(validate_location(Some("Middle Earth"), None).is_err());
    }

    #[test]
    fn username_rules() {
        let ok = CreateUserRequest {
            username: "quiz_master 9".to_string(),
            email: "a@b.io".to_string(),
            continent: None,
            country: None,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateUserRequest {
            username: "<script>".to_string(),
            email: "not-an-email".to_string(),
            continent: None,
            country: None,
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("email"));
    }
}
