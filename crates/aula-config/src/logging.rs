//! Logging configuration and tracing subscriber setup.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable holding a full `EnvFilter` directive.
pub const LOG_ENV_VAR: &str = "AULA_LOG";

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Fallback filter directive when `AULA_LOG` is unset (e.g. `"info"`,
    /// `"aula_rules=debug,info"`).
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Install a global `fmt` subscriber. `AULA_LOG` wins over the configured level.
///
/// # Errors
///
/// Returns `ConfigError::Logging` if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ConfigError::Logging(error.to_string()))
}
