// src/services/mod.rs

pub mod leaderboard;
pub mod ledger;
pub mod question_bank;
pub mod quiz;
pub mod ranking;
pub mod seed;
pub mod trivia;
