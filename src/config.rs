// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

/// Question count used by `retry()` when no request was remembered.
pub const DEFAULT_QUESTION_COUNT: u32 = 10;

/// The trivia API refuses to serve more than 50 questions per call.
pub const MAX_QUESTION_COUNT: u32 = 50;

pub const DEFAULT_TRIVIA_API_URL: &str = "https://opentdb.com/";

#[derive(Debug, Clone)]
pub struct Config {
    pub trivia_api_url: Url,
    /// Postgres connection string. When absent the service keeps stats and
    /// accounts in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub listen_addr: SocketAddr,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let trivia_api_url = env::var("TRIVIA_API_URL")
            .unwrap_or_else(|_| DEFAULT_TRIVIA_API_URL.to_string());
        let trivia_api_url = Url::parse(&trivia_api_url)
            .map_err(|e| AppError::BadRequest(format!("TRIVIA_API_URL is invalid: {}", e)))?;

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::BadRequest("JWT_SECRET must be set".to_string()))?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest("JWT_EXPIRATION must be seconds".to_string()))?,
            Err(_) => 86_400,
        };

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| AppError::BadRequest("LISTEN_ADDR must be host:port".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            trivia_api_url,
            database_url,
            jwt_secret,
            jwt_expiration,
            listen_addr,
            rust_log,
        })
    }
}
