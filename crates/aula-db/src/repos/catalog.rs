//! Subject catalog repository.

use aula_core::entities::Subject;
use aula_core::ids::PREFIX_SUBJECT;

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, now, parse_datetime};
use crate::service::AulaService;

pub(crate) const SELECT_COLS: &str = "id, code, name, created_at";

pub(crate) fn row_to_subject(row: &libsql::Row) -> Result<Subject, DatabaseError> {
    Ok(Subject {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

impl AulaService {
    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` when the code is already taken.
    pub async fn create_subject(&self, code: &str, name: &str) -> Result<Subject, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_SUBJECT).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO subjects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4)"),
                || libsql::params![id.as_str(), code, name, fmt_datetime(created_at)],
            )
            .await
            .map_err(|e| {
                DatabaseError::from_write(e, &format!("subject code {code}"), None, None)
            })?;

        tracing::debug!(subject_id = %id, code, "subject created");
        Ok(Subject {
            id,
            code: code.to_string(),
            name: name.to_string(),
            created_at,
        })
    }

    pub async fn get_subject(&self, id: &str) -> Result<Subject, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM subjects WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_subject(&row)
    }

    pub async fn get_subject_by_code(&self, code: &str) -> Result<Subject, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM subjects WHERE code = ?1"),
                || [code],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_subject(&row)
    }

    /// Subjects ordered by code.
    pub async fn list_subjects(&self, limit: Option<u32>) -> Result<Vec<Subject>, DatabaseError> {
        let limit = limit.unwrap_or_else(|| self.default_limit());
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM subjects ORDER BY code LIMIT ?1"),
                || [limit],
            )
            .await?;
        let mut subjects = Vec::new();
        while let Some(row) = rows.next().await? {
            subjects.push(row_to_subject(&row)?);
        }
        Ok(subjects)
    }
}
