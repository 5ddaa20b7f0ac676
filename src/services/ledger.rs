// src/services/ledger.rs

use crate::{
    config::UNLOCK_COST,
    error::AppError,
    models::{coins::DebitOutcome, question::Question},
    store::{DynStore, Store},
};

/// Per-user coin balance. Debits are atomic in the store; this layer validates
/// amounts and turns store outcomes into errors.
#[derive(Clone)]
pub struct Ledger {
    store: DynStore,
}

/// A revealed answer character and the balance left after paying for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub character: char,
    pub balance: i32,
}

fn positive(amount: i32) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::BadRequest(format!(
            "Coin amount must be a positive integer, got {}",
            amount
        )));
    }
    Ok(())
}

impl Ledger {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn credit(&self, user_id: &str, amount: i32) -> Result<i32, AppError> {
        positive(amount)?;
        let balance = self
            .store
            .credit_coins(user_id, amount)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!("Credited {} coins to {} (balance {})", amount, user_id, balance);
        Ok(balance)
    }

    pub async fn debit(&self, user_id: &str, amount: i32) -> Result<i32, AppError> {
        positive(amount)?;
        match self.store.debit_coins(user_id, amount).await? {
            DebitOutcome::Debited { balance } => Ok(balance),
            DebitOutcome::Insufficient { balance } => Err(AppError::InsufficientFunds {
                balance,
                required: amount,
            }),
            DebitOutcome::UnknownUser => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    /// Charges one unlock and reveals the upper-cased character at `index`.
    /// The index is checked before any coin moves.
    pub async fn unlock_character(
        &self,
        user_id: &str,
        question: &Question,
        index: usize,
    ) -> Result<Reveal, AppError> {
        let character = question.answer_char(index).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Character index {} is outside the answer (length {})",
                index,
                question.answer_len()
            ))
        })?;

        let balance = self.debit(user_id, UNLOCK_COST).await?;
        Ok(Reveal { character, balance })
    }
}
