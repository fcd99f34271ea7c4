//! libSQL database configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_path() -> String {
    "aula.db".to_string()
}

const fn default_busy_retry_attempts() -> u32 {
    4
}

const fn default_busy_retry_base_ms() -> u64 {
    50
}

const fn default_busy_retry_max_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Attempts (including the first) for statements hitting `database is locked`.
    #[serde(default = "default_busy_retry_attempts")]
    pub busy_retry_attempts: u32,

    /// Delay before the first retry, in milliseconds. Doubles per attempt.
    #[serde(default = "default_busy_retry_base_ms")]
    pub busy_retry_base_ms: u64,

    /// Upper bound for the retry delay, in milliseconds.
    #[serde(default = "default_busy_retry_max_ms")]
    pub busy_retry_max_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_retry_attempts: default_busy_retry_attempts(),
            busy_retry_base_ms: default_busy_retry_base_ms(),
            busy_retry_max_ms: default_busy_retry_max_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Whether the database lives only in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    #[must_use]
    pub const fn busy_retry_base(&self) -> Duration {
        Duration::from_millis(self.busy_retry_base_ms)
    }

    #[must_use]
    pub const fn busy_retry_max(&self) -> Duration {
        Duration::from_millis(self.busy_retry_max_ms)
    }

    /// Reject values the store cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty path, zero attempts, or
    /// a base delay above the maximum delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.busy_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.busy_retry_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.busy_retry_base_ms > self.busy_retry_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "database.busy_retry_base_ms".into(),
                reason: format!(
                    "{} exceeds busy_retry_max_ms ({})",
                    self.busy_retry_base_ms, self.busy_retry_max_ms
                ),
            });
        }
        Ok(())
    }
}
