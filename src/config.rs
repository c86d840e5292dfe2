use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read from environment variables.
///
/// `database_url` and `redis_url` are optional: without them the server runs on
/// in-memory stores and an in-memory job queue.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub cors_origin: Option<String>,
    pub jwt_secret: String,
    pub jwt_expires_in_secs: i64,
    pub bcrypt_cost: u32,
    pub job_delay: Duration,
    pub worker_enabled: bool,
    pub worker_poll_interval: Duration,
    pub worker_batch_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bcrypt_cost: u32 = parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let worker_poll_ms: u64 = parse_or("WORKER_POLL_INTERVAL_MS", 1000)?;
        if worker_poll_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKER_POLL_INTERVAL_MS",
                value: worker_poll_ms.to_string(),
            });
        }

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            server_port: parse_or("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            cors_origin: optional("CORS_ORIGIN"),
            jwt_secret: optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_expires_in_secs: parse_or("JWT_EXPIRES_IN_SECS", 3600)?,
            bcrypt_cost,
            job_delay: Duration::from_secs(parse_or("JOB_DELAY_SECS", 10)?),
            worker_enabled: parse_or("WORKER_ENABLED", true)?,
            worker_poll_interval: Duration::from_millis(worker_poll_ms),
            worker_batch_size: parse_or("WORKER_BATCH_SIZE", 10)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Unset and empty variables are both treated as absent.
fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
