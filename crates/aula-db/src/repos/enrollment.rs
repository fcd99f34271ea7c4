//! Course enrollment repository.
//!
//! An enrollment and its `ungraded` grade record are created together in one
//! transaction. `UNIQUE(student_id, offering_id)` is the authority against
//! duplicate enrollments; the grade-record insert trigger refuses published
//! offerings.

use aula_core::entities::CourseEnrollment;
use aula_core::enums::{EnrollmentStatus, GradeStatus};
use aula_core::ids::PREFIX_ENROLLMENT;

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, now, parse_datetime, parse_enum};
use crate::service::AulaService;

const SELECT_COLS: &str = "id, student_id, offering_id, status, created_at, updated_at";

fn row_to_enrollment(row: &libsql::Row) -> Result<CourseEnrollment, DatabaseError> {
    Ok(CourseEnrollment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        offering_id: row.get(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl AulaService {
    /// Enroll a student in an offering and open the enrollment's grade record.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Duplicate` when the student is already enrolled.
    /// - `DatabaseError::Published` when the offering is published.
    pub async fn enroll_in_offering(
        &self,
        student_id: &str,
        offering_id: &str,
    ) -> Result<CourseEnrollment, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_ENROLLMENT).await?;
        let what = format!("enrollment of {student_id} in {offering_id}");

        let tx = self.db().begin_write().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!(
                    "INSERT INTO course_enrollments ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5)"
                ),
                libsql::params![
                    id.as_str(),
                    student_id,
                    offering_id,
                    EnrollmentStatus::Pending.as_str(),
                    fmt_datetime(created_at)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &what, None, Some(offering_id)))?;
            tx.execute(
                "INSERT INTO grade_records
                 (enrollment_id, offering_id, status, draft_status, updated_at)
                 VALUES (?1, ?2, ?3, NULL, ?4)",
                libsql::params![
                    id.as_str(),
                    offering_id,
                    GradeStatus::Ungraded.as_str(),
                    fmt_datetime(created_at)
                ],
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, &what, None, Some(offering_id)))?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                tx.abandon().await;
                return Err(e);
            }
        }

        tracing::info!(enrollment_id = %id, student_id, offering_id, "course enrollment created");
        Ok(CourseEnrollment {
            id,
            student_id: student_id.to_string(),
            offering_id: offering_id.to_string(),
            status: EnrollmentStatus::Pending,
            created_at,
            updated_at: created_at,
        })
    }

    pub async fn get_enrollment(&self, id: &str) -> Result<CourseEnrollment, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} FROM course_enrollments WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_enrollment(&row)
    }

    /// Enrollments of an offering in enrollment order.
    pub async fn list_enrollments_for_offering(
        &self,
        offering_id: &str,
    ) -> Result<Vec<CourseEnrollment>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} FROM course_enrollments WHERE offering_id = ?1
                     ORDER BY created_at, id"
                ),
                || [offering_id],
            )
            .await?;
        let mut enrollments = Vec::new();
        while let Some(row) = rows.next().await? {
            enrollments.push(row_to_enrollment(&row)?);
        }
        Ok(enrollments)
    }
}

#[cfg(test)]
mod tests {
    use aula_core::enums::{EnrollmentStatus, GradeStatus};
    use pretty_assertions::assert_eq;

    use crate::error::DatabaseError;
    use crate::test_support::helpers::{seed_curriculum, seed_offering, test_service};

    #[tokio::test]
    async fn enrollment_opens_ungraded_record() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let (_, offering) = seed_offering(&svc, &c.calc1_placement).await;

        let enrollment = svc.enroll_in_offering(&c.student.id, &offering.id).await.unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);
        assert_eq!(svc.get_enrollment(&enrollment.id).await.unwrap(), enrollment);

        let record = svc.get_grade_record(&enrollment.id).await.unwrap();
        assert_eq!(record.status, GradeStatus::Ungraded);
        assert_eq!(record.student_id, c.student.id);
        assert_eq!(record.draft_status, None);
    }

    #[tokio::test]
    async fn duplicate_enrollment_rolls_back_cleanly() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let (_, offering) = seed_offering(&svc, &c.calc1_placement).await;

        svc.enroll_in_offering(&c.student.id, &offering.id).await.unwrap();
        let err = svc
            .enroll_in_offering(&c.student.id, &offering.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate(_)), "got {err:?}");
        assert_eq!(svc.list_enrollments_for_offering(&offering.id).await.unwrap().len(), 1);
        assert_eq!(svc.list_grade_records(&offering.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn published_offering_refuses_enrollment() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let (_, offering) = seed_offering(&svc, &c.calc1_placement).await;
        assert!(svc.mark_published(&offering.id, crate::helpers::now()).await.unwrap());

        let err = svc
            .enroll_in_offering(&c.student.id, &offering.id)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, DatabaseError::Published { offering_id } if *offering_id == offering.id),
            "got {err:?}"
        );
        assert!(svc.list_enrollments_for_offering(&offering.id).await.unwrap().is_empty());
    }
}
