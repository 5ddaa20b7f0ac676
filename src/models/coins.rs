// src/models/coins.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A purchasable coin pack. Prices are informational; charging happens at the payment provider.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoinPackage {
    pub id: &'static str,
    pub name: &'static str,
    pub coins: i32,
    pub bonus: i32,
    pub price: i32,
}

impl CoinPackage {
    pub fn total_coins(&self) -> i32 {
        self.coins + self.bonus
    }
}

pub const COIN_PACKAGES: [CoinPackage; 4] = [
    CoinPackage { id: "small", name: "Small Pack", coins: 10, bonus: 0, price: 2 },
    CoinPackage { id: "medium", name: "Medium Pack", coins: 25, bonus: 5, price: 5 },
    CoinPackage { id: "large", name: "Large Pack", coins: 60, bonus: 15, price: 10 },
    CoinPackage { id: "mega", name: "Mega Pack", coins: 150, bonus: 50, price: 20 },
];

pub fn find_package(id: &str) -> Option<&'static CoinPackage> {
    COIN_PACKAGES.iter().find(|p| p.id == id)
}

/// Payment-provider confirmation. Exactly one of `coins` or `package_id` is expected.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreditRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(range(min = 1, max = 100000))]
    pub coins: Option<i32>,
    pub package_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: String,
    pub coins: i32,
}

/// Store-level result of an atomic debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Debited { balance: i32 },
    Insufficient { balance: i32 },
    UnknownUser,
}
