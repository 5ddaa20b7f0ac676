// src/models/mod.rs

pub mod category;
pub mod coins;
pub mod geo;
pub mod leaderboard;
pub mod question;
pub mod quiz_session;
pub mod user;
