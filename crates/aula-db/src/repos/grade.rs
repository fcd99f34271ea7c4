//! Grade record repository: unsaved drafts, atomic batch saves, and publish.
//!
//! Grade records of a published offering are frozen by the
//! `grade_records_frozen_after_publish` trigger. Any write that reaches one
//! fails with `DatabaseError::Published`, whatever the caller checked first.

use aula_core::entities::GradeRecord;
use aula_core::enums::{EntityType, GradeStatus};
use aula_core::outcomes::GradeEdit;
use chrono::{DateTime, Utc};

use crate::WriteTx;
use crate::error::DatabaseError;
use crate::helpers::{
    fmt_datetime, get_opt_string, now, parse_datetime, parse_enum, parse_optional_enum,
};
use crate::service::AulaService;

const SELECT_COLS: &str =
    "g.enrollment_id, g.offering_id, e.student_id, g.status, g.draft_status, g.updated_at";
const FROM_RECORDS: &str =
    "FROM grade_records g JOIN course_enrollments e ON e.id = g.enrollment_id";

fn row_to_record(row: &libsql::Row) -> Result<GradeRecord, DatabaseError> {
    Ok(GradeRecord {
        enrollment_id: row.get(0)?,
        offering_id: row.get(1)?,
        student_id: row.get(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        draft_status: parse_optional_enum(get_opt_string(row, 4)?.as_deref())?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Merge explicit edits with outstanding drafts. Edits win; a repeated
/// enrollment keeps its first position and its last status.
fn merge_writes(
    edits: &[GradeEdit],
    drafts: Vec<(String, GradeStatus)>,
) -> Vec<(String, GradeStatus)> {
    let mut writes: Vec<(String, GradeStatus)> = Vec::with_capacity(edits.len() + drafts.len());
    for edit in edits {
        match writes.iter_mut().find(|(id, _)| *id == edit.enrollment_id) {
            Some(slot) => slot.1 = edit.status,
            None => writes.push((edit.enrollment_id.clone(), edit.status)),
        }
    }
    for (id, status) in drafts {
        if !writes.iter().any(|(written, _)| *written == id) {
            writes.push((id, status));
        }
    }
    writes
}

async fn write_all(
    tx: &WriteTx<'_>,
    offering_id: &str,
    edits: &[GradeEdit],
    at: DateTime<Utc>,
) -> Result<Vec<String>, DatabaseError> {
    let mut rows = tx
        .query(
            "SELECT enrollment_id, draft_status FROM grade_records
             WHERE offering_id = ?1 AND draft_status IS NOT NULL
             ORDER BY enrollment_id",
            [offering_id],
        )
        .await?;
    let mut drafts = Vec::new();
    while let Some(row) = rows.next().await? {
        let status: GradeStatus = parse_enum(&row.get::<String>(1)?)?;
        drafts.push((row.get::<String>(0)?, status));
    }
    drop(rows);

    let writes = merge_writes(edits, drafts);
    let stamp = fmt_datetime(at);
    let mut written = Vec::with_capacity(writes.len());
    for (enrollment_id, status) in writes {
        let changed = tx
            .execute(
                "UPDATE grade_records SET status = ?1, draft_status = NULL, updated_at = ?2
                 WHERE enrollment_id = ?3 AND offering_id = ?4",
                libsql::params![
                    status.as_str(),
                    stamp.as_str(),
                    enrollment_id.as_str(),
                    offering_id
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, "grade record", None, Some(offering_id)))?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: EntityType::GradeRecord,
                id: enrollment_id,
            });
        }
        written.push(enrollment_id);
    }
    Ok(written)
}

async fn publish_and_settle(
    tx: &WriteTx<'_>,
    offering_id: &str,
    at: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let stamp = fmt_datetime(at);
    let flipped = tx
        .execute(
            "UPDATE course_offerings SET published = 1, published_at = ?1
             WHERE id = ?2 AND published = 0
               AND NOT EXISTS (
                   SELECT 1 FROM grade_records
                   WHERE offering_id = ?2
                     AND (status = 'ungraded' OR draft_status IS NOT NULL)
               )",
            libsql::params![stamp.as_str(), offering_id],
        )
        .await?;
    if flipped == 0 {
        let mut rows = tx
            .query("SELECT published FROM course_offerings WHERE id = ?1", [offering_id])
            .await?;
        let Some(row) = rows.next().await? else {
            return Err(DatabaseError::NotFound {
                entity_type: EntityType::CourseOffering,
                id: offering_id.to_string(),
            });
        };
        if row.get::<i64>(0)? != 0 {
            return Ok(false);
        }
        return Err(DatabaseError::NotReady {
            offering_id: offering_id.to_string(),
        });
    }

    let mut rows = tx
        .query(
            "SELECT enrollment_id, status FROM grade_records WHERE offering_id = ?1",
            [offering_id],
        )
        .await?;
    let mut settled = Vec::new();
    while let Some(row) = rows.next().await? {
        let grade: GradeStatus = parse_enum(&row.get::<String>(1)?)?;
        settled.push((row.get::<String>(0)?, grade.settled_enrollment_status()));
    }
    drop(rows);

    for (enrollment_id, status) in settled {
        tx.execute(
            "UPDATE course_enrollments SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'pending'",
            libsql::params![status.as_str(), stamp.as_str(), enrollment_id.as_str()],
        )
        .await?;
    }
    Ok(true)
}

impl AulaService {
    pub async fn get_grade_record(
        &self,
        enrollment_id: &str,
    ) -> Result<GradeRecord, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} {FROM_RECORDS} WHERE g.enrollment_id = ?1"),
                || [enrollment_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_record(&row)
    }

    /// Grade records of an offering in enrollment order.
    pub async fn list_grade_records(
        &self,
        offering_id: &str,
    ) -> Result<Vec<GradeRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} {FROM_RECORDS} WHERE g.offering_id = ?1
                     ORDER BY e.created_at, e.id"
                ),
                || [offering_id],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Record an unsaved edit on one grade record.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::NoResult` when the enrollment has no grade record.
    /// - `DatabaseError::Published` when the offering is published.
    pub async fn stage_grade(
        &self,
        enrollment_id: &str,
        status: GradeStatus,
    ) -> Result<GradeRecord, DatabaseError> {
        let current = self.get_grade_record(enrollment_id).await?;
        let updated_at = now();
        self.db()
            .execute_with(
                "UPDATE grade_records SET draft_status = ?1, updated_at = ?2
                 WHERE enrollment_id = ?3",
                || libsql::params![status.as_str(), fmt_datetime(updated_at), enrollment_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::from_write(e, "grade draft", None, Some(&current.offering_id))
            })?;

        tracing::debug!(enrollment_id, %status, "grade draft staged");
        Ok(GradeRecord {
            draft_status: Some(status),
            updated_at,
            ..current
        })
    }

    /// Write `edits` and every outstanding draft of the offering as saved
    /// statuses in one transaction. Returns the enrollment ids written, edits
    /// first.
    ///
    /// # Errors
    ///
    /// Nothing is written when any record fails:
    /// - `DatabaseError::NotFound` for an edit outside the offering.
    /// - `DatabaseError::Published` when the offering is published.
    pub async fn write_grades(
        &self,
        offering_id: &str,
        edits: &[GradeEdit],
    ) -> Result<Vec<String>, DatabaseError> {
        let tx = self.db().begin_write().await?;
        match write_all(&tx, offering_id, edits, now()).await {
            Ok(written) => {
                tx.commit().await?;
                tracing::info!(offering_id, records = written.len(), "grades saved");
                Ok(written)
            }
            Err(e) => {
                tx.abandon().await;
                Err(e)
            }
        }
    }

    /// Set the terminal published flag and settle enrollment statuses
    /// (`approved -> regular`, `failed | absent -> failed`) in one transaction.
    ///
    /// Returns `false` without touching anything when the offering was
    /// already published.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::NotFound` when the offering does not exist.
    /// - `DatabaseError::NotReady` when a record is still ungraded or holds an
    ///   unsaved draft at the moment the write lock is held.
    pub async fn mark_published(
        &self,
        offering_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let tx = self.db().begin_write().await?;
        match publish_and_settle(&tx, offering_id, at).await {
            Ok(true) => {
                tx.commit().await?;
                tracing::info!(offering_id, "offering published");
                Ok(true)
            }
            Ok(false) => {
                tx.abandon().await;
                Ok(false)
            }
            Err(e) => {
                tx.abandon().await;
                Err(e)
            }
        }
    }
}
