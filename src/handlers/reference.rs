// src/handlers/reference.rs

//! Static enumerations the client renders pickers from.

use axum::{Json, extract::Query, response::IntoResponse};
use serde::Deserialize;

use crate::models::{category::Category, coins::COIN_PACKAGES, geo};

#[derive(Debug, Deserialize)]
pub struct CountriesQuery {
    pub continent: Option<String>,
}

pub async fn list_categories() -> impl IntoResponse {
    Json(Category::ALL.to_vec())
}

pub async fn list_continents() -> impl IntoResponse {
    Json(geo::continents())
}

/// Countries of one continent; all countries when the filter is absent or unknown.
pub async fn list_countries(Query(query): Query<CountriesQuery>) -> impl IntoResponse {
    Json(geo::countries(query.continent.as_deref()))
}

pub async fn list_coin_packages() -> impl IntoResponse {
    Json(COIN_PACKAGES.to_vec())
}
