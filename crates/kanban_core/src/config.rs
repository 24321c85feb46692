//! Environment-driven configuration.
//!
//! | Variable                 | Default                | Notes                      |
//! |--------------------------|------------------------|----------------------------|
//! | `KANBAN_DB_PATH`         | `kanban.db`            | database file, not blank   |
//! | `KANBAN_BUSY_TIMEOUT_MS` | `5000`                 | `0..=600000`               |
//! | `KANBAN_LOG_LEVEL`       | build-mode default     | trace/debug/info/warn/error|
//! | `KANBAN_LOG_DIR`         | unset (no file logs)   | absolute path              |
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the process environment win.

use crate::db::DbOptions;
use crate::logging::{default_log_level, normalize_level};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DB_PATH_VAR: &str = "KANBAN_DB_PATH";
pub const BUSY_TIMEOUT_VAR: &str = "KANBAN_BUSY_TIMEOUT_MS";
pub const LOG_LEVEL_VAR: &str = "KANBAN_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "KANBAN_LOG_DIR";

const DEFAULT_DB_PATH: &str = "kanban.db";
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an integer number of milliseconds, got `{value}`")]
    NotANumber { var: &'static str, value: String },
    #[error("{var} must be within 0..={max}, got {value}")]
    OutOfRange {
        var: &'static str,
        value: u64,
        max: u64,
    },
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanbanConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub log_level: &'static str,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout: DbOptions::default().busy_timeout,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl KanbanConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = lookup(DB_PATH_VAR) {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: DB_PATH_VAR,
                    message: "must not be blank".to_string(),
                });
            }
            config.db_path = PathBuf::from(value.trim());
        }

        if let Some(value) = read(BUSY_TIMEOUT_VAR) {
            let millis: u64 = value.parse().map_err(|_| ConfigError::NotANumber {
                var: BUSY_TIMEOUT_VAR,
                value: value.clone(),
            })?;
            if millis > MAX_BUSY_TIMEOUT_MS {
                return Err(ConfigError::OutOfRange {
                    var: BUSY_TIMEOUT_VAR,
                    value: millis,
                    max: MAX_BUSY_TIMEOUT_MS,
                });
            }
            config.busy_timeout = Duration::from_millis(millis);
        }

        if let Some(value) = read(LOG_LEVEL_VAR) {
            config.log_level = normalize_level(&value).map_err(|err| ConfigError::Invalid {
                var: LOG_LEVEL_VAR,
                message: err.to_string(),
            })?;
        }

        if let Some(value) = read(LOG_DIR_VAR) {
            let path = PathBuf::from(&value);
            if !path.is_absolute() {
                return Err(ConfigError::Invalid {
                    var: LOG_DIR_VAR,
                    message: format!("`{value}` is not an absolute path"),
                });
            }
            config.log_dir = Some(path);
        }

        Ok(config)
    }

    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: self.busy_timeout,
        }
    }
}
