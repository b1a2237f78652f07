use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::seat_grid::{DEFAULT_ROWS, DEFAULT_SEATS_PER_ROW};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

// Top-level configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub seating: SeatingConfig,
    pub reservation: ReservationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON list of movie records; the whole catalog for `memory`,
    /// imported into the `movies` table for `postgres`.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
}

// Optional seat-map cache
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub seat_cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeatingConfig {
    pub rows: u8,
    pub seats_per_row: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    pub max_conflict_retries: u32,
    pub confirm_timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys fall back
    /// to defaults, malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_raw = get("STORAGE_BACKEND").unwrap_or_else(|| "memory".to_string());
        let backend = backend_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "STORAGE_BACKEND",
            value: backend_raw.clone(),
        })?;

        let config = Config {
            app: AppConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(get("PORT"), "PORT", "8000")?,
                environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                rust_log: get("RUST_LOG")
                    .unwrap_or_else(|| "showtime_booking=debug,tower_http=debug".to_string()),
                currency_symbol: get("CURRENCY_SYMBOL").unwrap_or_else(|| "₹".to_string()),
            },
            storage: StorageConfig {
                backend,
                catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            },
            database: DatabaseConfig {
                url: get("DATABASE_URL"),
                pool_size: parse_or(get("DB_POOL_SIZE"), "DB_POOL_SIZE", "20")?,
            },
            redis: RedisConfig {
                url: get("REDIS_URL"),
                seat_cache_ttl_seconds: parse_or(get("SEAT_CACHE_TTL_SECONDS"), "SEAT_CACHE_TTL_SECONDS", "30")?,
            },
            seating: SeatingConfig {
                rows: parse_or(get("SEAT_ROWS"), "SEAT_ROWS", &DEFAULT_ROWS.to_string())?,
                seats_per_row: parse_or(get("SEATS_PER_ROW"), "SEATS_PER_ROW", &DEFAULT_SEATS_PER_ROW.to_string())?,
            },
            reservation: ReservationConfig {
                max_conflict_retries: parse_or(get("MAX_CONFLICT_RETRIES"), "MAX_CONFLICT_RETRIES", "2")?,
                confirm_timeout_secs: get("CONFIRM_TIMEOUT_SECS")
                    .map(|v| parse_or(Some(v), "CONFIRM_TIMEOUT_SECS", "0"))
                    .transpose()?,
            },
        };

        if config.storage.backend == StorageBackend::Postgres && config.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw })
}
