//! Career and student repository.

use aula_core::entities::{Career, Student};
use aula_core::enums::EntityType;
use aula_core::ids::{PREFIX_CAREER, PREFIX_STUDENT};

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_bool, get_int, now, parse_datetime};
use crate::service::AulaService;

const CAREER_COLS: &str = "id, name, department, plan_id, created_at";
const STUDENT_COLS: &str = "id, name, career_id, active, created_at";

fn row_to_career(row: &libsql::Row) -> Result<Career, DatabaseError> {
    Ok(Career {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        plan_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

fn row_to_student(row: &libsql::Row) -> Result<Student, DatabaseError> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        career_id: row.get(2)?,
        active: get_bool(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl AulaService {
    pub async fn create_career(
        &self,
        name: &str,
        department: &str,
        plan_id: &str,
    ) -> Result<Career, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_CAREER).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO careers ({CAREER_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                || {
                    libsql::params![
                        id.as_str(),
                        name,
                        department,
                        plan_id,
                        fmt_datetime(created_at)
                    ]
                },
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("career {name}"), None, None))?;

        Ok(Career {
            id,
            name: name.to_string(),
            department: department.to_string(),
            plan_id: plan_id.to_string(),
            created_at,
        })
    }

    pub async fn get_career(&self, id: &str) -> Result<Career, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {CAREER_COLS} FROM careers WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_career(&row)
    }

    /// Active students of a career, read from the `career_active_students` view.
    pub async fn active_student_count(&self, career_id: &str) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT active_students FROM career_active_students WHERE career_id = ?1",
                || [career_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => get_int(&row, 0),
            None => Err(DatabaseError::NotFound {
                entity_type: EntityType::Career,
                id: career_id.to_string(),
            }),
        }
    }

    /// Delete a career.
    ///
    /// Students reference their career with `ON DELETE RESTRICT`; a career
    /// that still lists inactive students cannot be deleted and fails with
    /// `DatabaseError::Duplicate`.
    pub async fn delete_career(&self, id: &str) -> Result<(), DatabaseError> {
        let deleted = self
            .db()
            .execute_with("DELETE FROM careers WHERE id = ?1", || [id])
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("career {id}"), None, None))?;
        if deleted == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: EntityType::Career,
                id: id.to_string(),
            });
        }
        tracing::info!(career_id = id, "career deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Students
    // -----------------------------------------------------------------------

    pub async fn create_student(
        &self,
        name: &str,
        career_id: &str,
    ) -> Result<Student, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_STUDENT).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO students ({STUDENT_COLS}) VALUES (?1, ?2, ?3, 1, ?4)"),
                || libsql::params![id.as_str(), name, career_id, fmt_datetime(created_at)],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &format!("student {name}"), None, None))?;

        Ok(Student {
            id,
            name: name.to_string(),
            career_id: career_id.to_string(),
            active: true,
            created_at,
        })
    }

    pub async fn get_student(&self, id: &str) -> Result<Student, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {STUDENT_COLS} FROM students WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_student(&row)
    }

    pub async fn set_student_active(&self, id: &str, active: bool) -> Result<(), DatabaseError> {
        let updated = self
            .db()
            .execute_with("UPDATE students SET active = ?1 WHERE id = ?2", || {
                libsql::params![i64::from(active), id]
            })
            .await?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: EntityType::Student,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Study plan of the student's career.
    pub async fn student_plan(&self, student_id: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT c.plan_id FROM students s JOIN careers c ON c.id = s.career_id
                 WHERE s.id = ?1",
                || [student_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
