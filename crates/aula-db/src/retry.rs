//! Busy-database retry logic.
//!
//! A local libSQL file allows one writer at a time. A second process (or a
//! second handle) that writes while the lock is held gets `SQLITE_BUSY`
//! ("database is locked"). These clear on their own once the holder commits,
//! so single-statement reads and writes retry with capped exponential backoff.
//!
//! Statements inside an explicit transaction are not retried: a busy error
//! there aborts the whole transaction and surfaces to the caller.

use std::time::Duration;

use aula_config::DatabaseConfig;

/// Configuration for retry behavior on busy errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_attempts: config.busy_retry_attempts.max(1),
            base_delay: config.busy_retry_base(),
            max_delay: config.busy_retry_max(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Detect lock contention errors.
///
/// The predicate is intentionally narrow to avoid retrying genuine
/// SQL or constraint errors.
pub fn is_busy_error(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked") || msg.contains("database table is locked")
}
