// src/handlers/mod.rs

pub mod coins;
pub mod docs;
pub mod health;
pub mod leaderboard;
pub mod questions;
pub mod quiz;
pub mod reference;
pub mod users;
