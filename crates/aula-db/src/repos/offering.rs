//! Course offering repository.

use aula_core::entities::CourseOffering;
use aula_core::enums::EntityType;
use aula_core::ids::PREFIX_OFFERING;

use crate::error::DatabaseError;
use crate::helpers::{
    OptionalExt, fmt_datetime, get_bool, get_int, get_opt_string, now, parse_datetime,
    parse_optional_datetime,
};
use crate::service::AulaService;

/// Offering columns joined with the placement for the denormalized subject id.
pub(crate) const SELECT_COLS: &str = "o.id, o.plan_subject_id, ps.subject_id, o.teacher_id, \
     o.assignment_id, o.academic_year, o.term, o.published, o.published_at, o.created_at";

pub(crate) const FROM_OFFERINGS: &str =
    "FROM course_offerings o JOIN plan_subjects ps ON ps.id = o.plan_subject_id";

pub(crate) fn row_to_offering(row: &libsql::Row) -> Result<CourseOffering, DatabaseError> {
    Ok(CourseOffering {
        id: row.get(0)?,
        plan_subject_id: row.get(1)?,
        subject_id: row.get(2)?,
        teacher_id: row.get(3)?,
        assignment_id: get_opt_string(row, 4)?,
        academic_year: get_int(row, 5)?,
        term: get_int(row, 6)?,
        published: get_bool(row, 7)?,
        published_at: parse_optional_datetime(get_opt_string(row, 8)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl AulaService {
    /// Open an offering of a placement, taught by a teacher assigned to the
    /// placement's subject.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` when the placement does not exist or
    /// the teacher is not assigned to its subject.
    pub async fn create_offering(
        &self,
        plan_subject_id: &str,
        teacher_id: &str,
        academic_year: u16,
        term: u8,
    ) -> Result<CourseOffering, DatabaseError> {
        let placement = self
            .get_plan_subject(plan_subject_id)
            .await
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound {
                entity_type: EntityType::PlanSubject,
                id: plan_subject_id.to_string(),
            })?;
        let assignment = self
            .get_assignment(teacher_id, &placement.subject_id)
            .await
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound {
                entity_type: EntityType::TeacherAssignment,
                id: format!("{teacher_id}/{}", placement.subject_id),
            })?;

        let created_at = now();
        let id = self.db().generate_id(PREFIX_OFFERING).await?;
        self.db()
            .execute_with(
                "INSERT INTO course_offerings
                 (id, plan_subject_id, teacher_id, assignment_id,
                  academic_year, term, published, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                || {
                    libsql::params![
                        id.as_str(),
                        plan_subject_id,
                        teacher_id,
                        assignment.id.as_str(),
                        i64::from(academic_year),
                        i64::from(term),
                        fmt_datetime(created_at)
                    ]
                },
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, "course offering", None, None))?;

        tracing::debug!(offering_id = %id, plan_subject_id, teacher_id, "offering created");
        Ok(CourseOffering {
            id,
            plan_subject_id: plan_subject_id.to_string(),
            subject_id: placement.subject_id,
            teacher_id: teacher_id.to_string(),
            assignment_id: Some(assignment.id),
            academic_year,
            term,
            published: false,
            published_at: None,
            created_at,
        })
    }

    pub async fn get_offering(&self, id: &str) -> Result<CourseOffering, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SELECT_COLS} {FROM_OFFERINGS} WHERE o.id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_offering(&row)
    }

    /// Offerings taught by a teacher, newest academic year first.
    pub async fn list_offerings_for_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<CourseOffering>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {SELECT_COLS} {FROM_OFFERINGS} WHERE o.teacher_id = ?1
                     ORDER BY o.academic_year DESC, o.term DESC, o.id"
                ),
                || [teacher_id],
            )
            .await?;
        let mut offerings = Vec::new();
        while let Some(row) = rows.next().await? {
            offerings.push(row_to_offering(&row)?);
        }
        Ok(offerings)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::error::DatabaseError;
    use crate::test_support::helpers::{seed_curriculum, seed_offering, test_service};

    #[tokio::test]
    async fn offering_roundtrips_with_subject() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let (teacher, offering) = seed_offering(&svc, &c.calc1_placement).await;

        let fetched = svc.get_offering(&offering.id).await.unwrap();
        assert_eq!(fetched, offering);
        assert_eq!(fetched.subject_id, c.calculus_1.id);
        assert!(!fetched.published);

        let listed = svc.list_offerings_for_teacher(&teacher.id).await.unwrap();
        assert_eq!(listed, vec![offering]);
    }

    #[tokio::test]
    async fn unassigned_teacher_cannot_open_offering() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let teacher = svc.create_teacher("Prof. Vega").await.unwrap();
        let err = svc
            .create_offering(&c.calc1_placement.id, &teacher.id, 2026, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }), "got {err:?}");
    }
}
