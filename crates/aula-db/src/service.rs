//! Service layer over the raw database handle.
//!
//! `AulaService` wraps `AulaDb`. All repo methods are implemented as
//! `impl AulaService` blocks under `repos/`, and the `aula-core` ports are
//! implemented on top of them in `ports.rs`.

use aula_config::AulaConfig;

use crate::AulaDb;
use crate::error::DatabaseError;
use crate::retry::RetryConfig;

/// Fallback page size for list queries.
const DEFAULT_LIMIT: u32 = 50;

/// Repository facade over one libSQL database.
pub struct AulaService {
    db: AulaDb,
    default_limit: u32,
}

impl AulaService {
    /// Create a new service over a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = AulaDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the configured database cannot be opened.
    pub async fn from_config(config: &AulaConfig) -> Result<Self, DatabaseError> {
        let retry = RetryConfig::from(&config.database);
        let db = AulaDb::open_with_retry(&config.database.path, retry).await?;
        Ok(Self {
            db,
            default_limit: config.general.default_limit,
        })
    }

    /// Create from an existing `AulaDb` (for testing).
    #[must_use]
    pub const fn from_db(db: AulaDb) -> Self {
        Self {
            db,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &AulaDb {
        &self.db
    }

    /// Page size applied when a list query carries no explicit limit.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_config_applies_general_limit() {
        let mut config = AulaConfig::default();
        config.database.path = ":memory:".into();
        config.general.default_limit = 7;
        let svc = AulaService::from_config(&config).await.unwrap();
        assert_eq!(svc.default_limit(), 7);
        assert_eq!(
            svc.db().retry_config().max_attempts,
            config.database.busy_retry_attempts
        );
    }

    #[tokio::test]
    async fn new_local_uses_fallback_limit() {
        let svc = AulaService::new_local(":memory:").await.unwrap();
        assert_eq!(svc.default_limit(), DEFAULT_LIMIT);
    }
}
