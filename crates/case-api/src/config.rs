//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Minimum length accepted for the token signing secret.
const MIN_SECRET_LENGTH: usize = 32;

/// Case API server configuration.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Secret used to sign bearer tokens.
    pub secret_key: String,
    /// Token lifetime in minutes.
    pub token_expiry_minutes: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CASE_API_ADDR` | Server bind address | `127.0.0.1:8461` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:casework.db?mode=rwc` |
    /// | `SECRET_KEY` | Token signing secret, at least 32 chars | (required) |
    /// | `TOKEN_EXPIRY_MINUTES` | Token lifetime in minutes | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("CASE_API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8461".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:casework.db?mode=rwc".to_string());

        let secret_key = env::var("SECRET_KEY").map_err(|_| ConfigError::MissingSecretKey)?;
        if secret_key.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretKeyTooShort);
        }

        let token_expiry_minutes = match env::var("TOKEN_EXPIRY_MINUTES") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidTokenExpiry)?,
            Err(_) => 30,
        };

        Ok(Self {
            addr,
            database_url,
            secret_key,
            token_expiry_minutes,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CASE_API_ADDR format")]
    InvalidAddr,

    #[error("SECRET_KEY environment variable is required")]
    MissingSecretKey,

    #[error("SECRET_KEY must be at least 32 characters")]
    SecretKeyTooShort,

    #[error("Invalid TOKEN_EXPIRY_MINUTES value")]
    InvalidTokenExpiry,
}
