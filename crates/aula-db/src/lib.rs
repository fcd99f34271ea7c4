//! # aula-db
//!
//! libSQL persistence for the academic eligibility engine.
//!
//! Handles all relational state: the subject catalog, study plans and their
//! prerequisite graphs, careers, students, teachers, offerings, enrollments,
//! grade records, exam boards, and the audit trail. Implements the
//! `aula-core` ports for `AulaService`.
//!
//! Storage is authoritative for the rules that must survive concurrent
//! writers: uniqueness, the teacher-per-subject cap, and grade immutability
//! after publish are all enforced by constraints and triggers (see
//! `migrations/001_initial.sql`).
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29).

pub mod error;
pub mod helpers;
mod migrations;
mod ports;
pub mod repos;
pub mod retry;
pub mod service;

#[cfg(test)]
mod test_support;

use std::ops::Deref;

use error::DatabaseError;
use libsql::params::IntoParams;
use libsql::{Builder, TransactionBehavior};
use retry::{RetryConfig, is_busy_error};
use tokio::sync::{Mutex, MutexGuard};

/// Central database handle.
///
/// Wraps a libSQL database and connection. Provides ID generation, busy
/// retry for single statements, and serialized write transactions.
pub struct AulaDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    retry: RetryConfig,
    write_gate: Mutex<()>,
}

/// An `IMMEDIATE` transaction holding the handle's write gate.
pub struct WriteTx<'a> {
    tx: libsql::Transaction,
    _gate: MutexGuard<'a, ()>,
}

impl WriteTx<'_> {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the COMMIT fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the ROLLBACK fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Roll back after a failed step. A failing ROLLBACK is logged and
    /// swallowed so the caller can return the error that caused it.
    pub async fn abandon(self) {
        if let Err(e) = self.tx.rollback().await {
            tracing::warn!(error = %e, "rollback failed");
        }
    }
}

impl Deref for WriteTx<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl AulaDb {
    /// Open a local database at the given path with default retry settings.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open_with_retry(path, RetryConfig::default()).await
    }

    /// Open a local database with explicit busy-retry settings.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_with_retry(path: &str, retry: RetryConfig) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let aula_db = Self {
            db,
            conn,
            retry,
            write_gate: Mutex::new(()),
        };
        aula_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(aula_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    #[must_use]
    pub const fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"sub-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Execute one write statement, retrying while the database is busy.
    ///
    /// `params` is called once per attempt since libSQL consumes parameters.
    ///
    /// # Errors
    ///
    /// Returns the last libSQL error once attempts are exhausted, or the
    /// first non-busy error immediately.
    pub async fn execute_with<P, F>(&self, sql: &str, params: F) -> Result<u64, libsql::Error>
    where
        P: IntoParams,
        F: Fn() -> P,
    {
        let _gate = self.write_gate.lock().await;
        let mut attempt = 1;
        loop {
            match self.conn.execute(sql, params()).await {
                Err(e) if attempt < self.retry.max_attempts && is_busy_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(attempt, ?delay, error = %e, "database busy; retrying write");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Run one query, retrying while the database is busy.
    ///
    /// # Errors
    ///
    /// Same as [`AulaDb::execute_with`].
    pub async fn query_with<P, F>(
        &self,
        sql: &str,
        params: F,
    ) -> Result<libsql::Rows, libsql::Error>
    where
        P: IntoParams,
        F: Fn() -> P,
    {
        let mut attempt = 1;
        loop {
            match self.conn.query(sql, params()).await {
                Err(e) if attempt < self.retry.max_attempts && is_busy_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(attempt, ?delay, error = %e, "database busy; retrying read");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Begin an `IMMEDIATE` write transaction.
    ///
    /// Takes the handle's write gate first, so writers sharing this handle
    /// never nest transactions on the one connection. `BEGIN` itself retries
    /// on busy like a single statement.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot be started.
    pub async fn begin_write(&self) -> Result<WriteTx<'_>, DatabaseError> {
        let gate = self.write_gate.lock().await;
        let mut attempt = 1;
        loop {
            match self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .await
            {
                Ok(tx) => return Ok(WriteTx { tx, _gate: gate }),
                Err(e) if attempt < self.retry.max_attempts && is_busy_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(attempt, ?delay, error = %e, "database busy; retrying BEGIN");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
