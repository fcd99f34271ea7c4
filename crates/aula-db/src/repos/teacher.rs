//! Teacher and teacher-assignment repository.
//!
//! The per-subject cap lives in the `teacher_assignments_cap` trigger; an
//! insert past the cap fails with `DatabaseError::CapacityExceeded` no matter
//! what the caller checked beforehand.

use aula_core::entities::{Teacher, TeacherAssignment};
use aula_core::enums::EntityType;
use aula_core::ids::{PREFIX_ASSIGNMENT, PREFIX_TEACHER};

use crate::WriteTx;
use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_bool, get_int, now, parse_datetime};
use crate::service::AulaService;

const TEACHER_COLS: &str = "id, name, role_active, created_at";
const ASSIGNMENT_COLS: &str = "id, teacher_id, subject_id, created_at";

fn row_to_teacher(row: &libsql::Row) -> Result<Teacher, DatabaseError> {
    Ok(Teacher {
        id: row.get(0)?,
        name: row.get(1)?,
        role_active: get_bool(row, 2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

fn row_to_assignment(row: &libsql::Row) -> Result<TeacherAssignment, DatabaseError> {
    Ok(TeacherAssignment {
        id: row.get(0)?,
        teacher_id: row.get(1)?,
        subject_id: row.get(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

/// Flip the teacher role inside an assignment transaction.
async fn set_teacher_role(
    tx: &WriteTx<'_>,
    teacher_id: &str,
    active: bool,
) -> Result<(), DatabaseError> {
    let updated = tx
        .execute(
            "UPDATE teachers SET role_active = ?1 WHERE id = ?2",
            libsql::params![i64::from(active), teacher_id],
        )
        .await?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: EntityType::Teacher,
            id: teacher_id.to_string(),
        });
    }
    Ok(())
}

impl AulaService {
    pub async fn create_teacher(&self, name: &str) -> Result<Teacher, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_TEACHER).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO teachers ({TEACHER_COLS}) VALUES (?1, ?2, 1, ?3)"),
                || libsql::params![id.as_str(), name, fmt_datetime(created_at)],
            )
            .await?;

        Ok(Teacher {
            id,
            name: name.to_string(),
            role_active: true,
            created_at,
        })
    }

    pub async fn get_teacher(&self, id: &str) -> Result<Teacher, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {TEACHER_COLS} FROM teachers WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_teacher(&row)
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    /// Assign a teacher to a subject and (re)activate the teacher role.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::CapacityExceeded` when the subject already has two teachers.
    /// - `DatabaseError::Duplicate` when the pair is already assigned.
    pub async fn create_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<TeacherAssignment, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_ASSIGNMENT).await?;

        let tx = self.db().begin_write().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!(
                    "INSERT INTO teacher_assignments ({ASSIGNMENT_COLS}) VALUES (?1, ?2, ?3, ?4)"
                ),
                libsql::params![id.as_str(), teacher_id, subject_id, fmt_datetime(created_at)],
            )
            .await
            .map_err(|e| {
                DatabaseError::from_write(
                    e,
                    &format!("assignment of {teacher_id} to {subject_id}"),
                    Some(subject_id),
                    None,
                )
            })?;
            set_teacher_role(&tx, teacher_id, true).await
        }
        .await;

        match result {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                tx.abandon().await;
                return Err(e);
            }
        }

        tracing::info!(teacher_id, subject_id, assignment_id = %id, "teacher assigned");
        Ok(TeacherAssignment {
            id,
            teacher_id: teacher_id.to_string(),
            subject_id: subject_id.to_string(),
            created_at,
        })
    }

    pub async fn get_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<TeacherAssignment, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {ASSIGNMENT_COLS} FROM teacher_assignments
                     WHERE teacher_id = ?1 AND subject_id = ?2"
                ),
                || [teacher_id, subject_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_assignment(&row)
    }

    pub async fn count_assignments_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT COUNT(*) FROM teacher_assignments WHERE subject_id = ?1",
                || [subject_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_int(&row, 0)
    }

    pub async fn list_assignments_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Vec<TeacherAssignment>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {ASSIGNMENT_COLS} FROM teacher_assignments WHERE subject_id = ?1
                     ORDER BY created_at, id"
                ),
                || [subject_id],
            )
            .await?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next().await? {
            assignments.push(row_to_assignment(&row)?);
        }
        Ok(assignments)
    }

    /// Remove an assignment. Returns the number of assignments the teacher
    /// still holds; at zero the teacher role is deactivated in the same
    /// transaction. Offerings created by the assignment keep their history
    /// with `assignment_id` set to NULL.
    pub async fn delete_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<u32, DatabaseError> {
        let tx = self.db().begin_write().await?;
        let result: Result<u32, DatabaseError> = async {
            let deleted = tx
                .execute(
                    "DELETE FROM teacher_assignments WHERE teacher_id = ?1 AND subject_id = ?2",
                    [teacher_id, subject_id],
                )
                .await?;
            if deleted == 0 {
                return Err(DatabaseError::NotFound {
                    entity_type: EntityType::TeacherAssignment,
                    id: format!("{teacher_id}/{subject_id}"),
                });
            }

            let mut rows = tx
                .query(
                    "SELECT COUNT(*) FROM teacher_assignments WHERE teacher_id = ?1",
                    [teacher_id],
                )
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            let remaining: u32 = get_int(&row, 0)?;
            drop(rows);

            if remaining == 0 {
                set_teacher_role(&tx, teacher_id, false).await?;
            }
            Ok(remaining)
        }
        .await;

        match result {
            Ok(remaining) => {
                tx.commit().await?;
                tracing::info!(teacher_id, subject_id, remaining, "teacher unassigned");
                Ok(remaining)
            }
            Err(e) => {
                tx.abandon().await;
                Err(e)
            }
        }
    }
}
