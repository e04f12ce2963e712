// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::error::AppError;

/// Questions shown per test when a client opens a test.
pub const QUESTIONS_PER_TEST: usize = 10;

/// Number of subjects reported as weakest areas.
pub const WEAKEST_AREAS_LIMIT: usize = 3;

/// Thirty days.
const DEFAULT_JWT_EXPIRATION: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Optional JSON catalog used to seed an empty `tests` table.
    /// The bundled fixtures are used when unset.
    pub catalog_path: Option<String>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://ent.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                AppError::InternalServerError(format!("JWT_EXPIRATION is not a number: {}", e))
            })?,
            Err(_) => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| {
                AppError::InternalServerError(format!("PORT is not a valid port: {}", e))
            })?,
            Err(_) => 5000,
        };

        let catalog_path = env::var("CATALOG_PATH").ok().filter(|p| !p.is_empty());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            catalog_path,
            cors_origins,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let origins = parse_origins(" http://localhost:8081, ,http://127.0.0.1:19006 ");
        assert_eq!(origins, vec!["http://localhost:8081", "http://127.0.0.1:19006"]);
    }
}
