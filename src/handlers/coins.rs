// src/handlers/coins.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::coins::{BalanceResponse, CreditRequest, find_package},
    services::quiz::QuizService,
};

/// Resolves the credited amount from a raw coin count or a package id.
fn credit_amount(req: &CreditRequest) -> Result<i32, AppError> {
    match (req.coins, req.package_id.as_deref()) {
        (Some(coins), None) => Ok(coins),
        (None, Some(id)) => find_package(id)
            .map(|p| p.total_coins())
            .ok_or_else(|| AppError::BadRequest(format!("Unknown coin package '{}'", id))),
        _ => Err(AppError::BadRequest(
            "Provide exactly one of coins or package_id".to_string(),
        )),
    }
}

/// Admin-only credit, called once the payment provider confirms a purchase.
pub async fn credit_coins(
    State(quiz): State<Arc<QuizService>>,
    Json(req): Json<CreditRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let amount = credit_amount(&req)?;
    let coins = quiz.ledger().credit(&req.user_id, amount).await?;

    Ok(Json(BalanceResponse {
        user_id: req.user_id,
        coins,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(coins: Option<i32>, package_id: Option<&str>) -> CreditRequest {
        CreditRequest {
            user_id: "u".to_string(),
            coins,
            package_id: package_id.map(str::to_string),
        }
    }

    #[test]
    fn package_credit_includes_bonus() {
        assert_eq!(credit_amount(&req(None, Some("medium"))).unwrap(), 30);
        assert_eq!(credit_amount(&req(Some(7), None)).unwrap(), 7);
    }

    #[test]
    fn ambiguous_or_unknown_credit_is_rejected() {
        assert!(credit_amount(&req(Some(5), Some("small"))).is_err());
        assert!(credit_amount(&req(None, None)).is_err());
        assert!(credit_amount(&req(None, Some("giga"))).is_err());
    }
}
