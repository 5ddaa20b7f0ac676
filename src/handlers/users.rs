// src/handlers/users.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        category::Category,
        geo,
        leaderboard::{RankQuery, RankResponse},
        user::{CreateUserRequest, NewUser, UpdateLocationRequest, validate_location},
    },
    services::{leaderboard::today, quiz::QuizService},
    store::{DynStore, Store},
    utils::jwt::Claims,
};

/// A missing continent is filled in from the country.
fn resolve_location(
    continent: Option<String>,
    country: Option<String>,
) -> Result<(Option<String>, Option<String>), AppError> {
    let continent = continent.filter(|c| !c.is_empty());
    let country = country.filter(|c| !c.is_empty());
    validate_location(continent.as_deref(), country.as_deref())?;

    let continent = continent.or_else(|| {
        country
            .as_deref()
            .and_then(geo::continent_of)
            .map(str::to_string)
    });
    Ok((continent, country))
}

/// Creates the caller's profile with the starting coin grant.
///
/// The profile id is the token subject. Returns 201, or 409 when the id,
/// username or email is taken.
pub async fn create_profile(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (continent, country) = resolve_location(payload.continent, payload.country)?;

    let user = store
        .create_user(NewUser {
            id: claims.user_id().to_string(),
            username: payload.username.trim().to_string(),
            email: payload.email,
            continent,
            country,
        })
        .await?;

    tracing::info!("Profile created for {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_me(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .get_user(claims.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(user))
}

/// Location is the only client-writable profile field. Omitted fields are kept.
pub async fn update_me(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = store
        .get_user(claims.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    let (continent, country) = resolve_location(payload.continent, payload.country)?;

    // Omitted fields keep their stored value, so the merged pair must still agree.
    validate_location(
        continent.as_deref().or(current.continent.as_deref()),
        country.as_deref().or(current.country.as_deref()),
    )?;

    let user = store
        .update_location(claims.user_id(), continent, country)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(user))
}

pub async fn get_user(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Rank in one (category, date) partition; 0 when unranked.
pub async fn get_rank(
    State(quiz): State<Arc<QuizService>>,
    Path(id): Path<String>,
    Query(query): Query<RankQuery>,
) -> Result<impl IntoResponse, AppError> {
    let category: Category = query.category.parse()?;
    let date = query.date.unwrap_or_else(today);
    let rank = quiz.leaderboard().rank_of(&id, category, date).await?;

    Ok(Json(RankResponse { rank, category, date }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continent_is_derived_from_country() {
        let (continent, country) = resolve_location(None, Some("Japan".to_string())).unwrap();
        assert_eq!(continent.as_deref(), Some("Asia"));
        assert_eq!(country.as_deref(), Some("Japan"));
    }

    #[test]
    fn blank_location_fields_are_cleared() {
        let (continent, country) = resolve_location(Some(String::new()), Some(String::new())).unwrap();
        assert_eq!(continent, None);
        assert_eq!(country, None);
    }

    #[test]
    fn mismatched_location_is_rejected() {
        assert!(matches!(
            resolve_location(Some("Europe".to_string()), Some("Japan".to_string())),
            Err(AppError::BadRequest(_))
        ));
    }
}
