use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub auth_issuer: String,
    pub frontend_url: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://scheduling.db".to_string()),
            port: parse_var("PORT", 5000)?,
            jwt_secret: env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_ttl_hours: parse_var("JWT_TTL_HOURS", 24 * 7)?,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "scheduling-backend".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}
