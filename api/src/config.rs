use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://messenger.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub redis_url: Option<String>,
    pub cache_ttl: Duration,
    pub cache_timeout: Duration,
    pub jwt_secret: String,
    /// Shared key the membership webhook must present.
    pub api_key: String,
    /// Payment provider key. Checkout itself lives outside this service.
    pub payment_api_key: Option<String>,
    pub bind_addr: String,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| match lookup(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AppError::ConfigurationMissing(key.to_string())),
        };
        let parsed = |key: &str, default: u64| -> Result<u64, AppError> {
            match lookup(key) {
                Some(raw) => parse(key, &raw),
                None => Ok(default),
            }
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => match parse::<u32>("DB_MAX_CONNECTIONS", &raw)? {
                0 => {
                    return Err(AppError::ConfigurationMissing(
                        "DB_MAX_CONNECTIONS must be at least 1".into(),
                    ))
                }
                n => n,
            },
            None => 5,
        };

        let payment_api_key = match lookup("PAYMENT_API_KEY") {
            Some(value) if value.trim().is_empty() => {
                return Err(AppError::ConfigurationMissing("PAYMENT_API_KEY".into()))
            }
            other => other,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            cache_ttl: Duration::from_secs(parsed("CACHE_TTL_SECS", 600)?),
            cache_timeout: Duration::from_millis(parsed("CACHE_TIMEOUT_MS", 250)?),
            jwt_secret: required("JWT_SECRET")?,
            api_key: required("API_KEY")?,
            payment_api_key,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ConfigurationMissing(format!("{key} is not a valid number")))
}
