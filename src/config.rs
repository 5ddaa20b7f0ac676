// src/config.rs

use std::{env, net::SocketAddr, time::Duration};

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

/// Points awarded for each exactly matched answer.
pub const POINTS_PER_CORRECT_ANSWER: i32 = 100;

/// One-time coin grant for a freshly created profile.
pub const STARTING_COINS: i32 = 10;

/// Coins charged to reveal a single answer character.
pub const UNLOCK_COST: i32 = 1;

/// Stock headroom required above a requested sample before replenishment kicks in.
pub const LOW_STOCK_MARGIN: i64 = 40;

/// Categories holding fewer questions than this are replenished at startup.
pub const SEED_THRESHOLD: i64 = 10;

/// Questions requested from the trivia source per replenishment.
pub const REPLENISH_BATCH_SIZE: u32 = 50;

pub const DEFAULT_SAMPLE_SIZE: i64 = 10;
pub const MAX_SAMPLE_SIZE: i64 = 50;
pub const LEADERBOARD_LIMIT: i64 = 100;

const DEFAULT_TRIVIA_API_URL: &str = "https://opentdb.com/api.php";
const DEFAULT_TRIVIA_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the non-durable in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub trivia_api_url: Url,
    pub trivia_timeout: Duration,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let trivia_api_url = env::var("TRIVIA_API_URL")
            .unwrap_or_else(|_| DEFAULT_TRIVIA_API_URL.to_string());
        let trivia_api_url = Url::parse(&trivia_api_url).map_err(|e| ConfigError::Invalid {
            name: "TRIVIA_API_URL",
            reason: e.to_string(),
        })?;

        let trivia_timeout = match env::var("TRIVIA_API_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: "TRIVIA_API_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                Duration::from_secs(secs.max(1))
            }
            Err(_) => Duration::from_secs(DEFAULT_TRIVIA_TIMEOUT_SECS),
        };

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            trivia_api_url,
            trivia_timeout,
            log_dir,
        })
    }
}
