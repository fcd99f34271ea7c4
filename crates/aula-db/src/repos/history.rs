//! Academic history reads: completion status per subject and active final
//! registrations.
//!
//! A subject is `course_approved` once one of the student's course
//! enrollments for it settled to `regular`, and `final_approved` once a board
//! registration for it was graded `approved`.

use std::collections::HashMap;

use aula_core::enums::{BoardEnrollmentStatus, CompletionStatus, EnrollmentStatus};
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_int, placeholders};
use crate::service::AulaService;

impl AulaService {
    /// Completion status for each of `subject_ids`, in one query.
    ///
    /// Every requested subject is present in the result; subjects without a
    /// record map to `CompletionStatus::None`.
    pub async fn completions(
        &self,
        student_id: &str,
        subject_ids: &[String],
    ) -> Result<HashMap<String, CompletionStatus>, DatabaseError> {
        let mut statuses: HashMap<String, CompletionStatus> = subject_ids
            .iter()
            .map(|id| (id.clone(), CompletionStatus::None))
            .collect();
        if subject_ids.is_empty() {
            return Ok(statuses);
        }

        // ?1 student, ?2 regular, ?3 approved, ?4.. subject ids (used twice).
        let in_list = placeholders(4, subject_ids.len());
        let sql = format!(
            "SELECT subject_id, MAX(level) FROM (
                 SELECT ps.subject_id AS subject_id, 1 AS level
                 FROM course_enrollments e
                 JOIN course_offerings o ON o.id = e.offering_id
                 JOIN plan_subjects ps ON ps.id = o.plan_subject_id
                 WHERE e.student_id = ?1 AND e.status = ?2 AND ps.subject_id IN ({in_list})
                 UNION ALL
                 SELECT b.subject_id AS subject_id, 2 AS level
                 FROM board_enrollments be
                 JOIN exam_boards b ON b.id = be.board_id
                 WHERE be.student_id = ?1 AND be.status = ?3 AND b.subject_id IN ({in_list})
             ) GROUP BY subject_id"
        );

        let mut params: Vec<libsql::Value> = vec![
            student_id.into(),
            EnrollmentStatus::Regular.as_str().into(),
            BoardEnrollmentStatus::Approved.as_str().into(),
        ];
        params.extend(subject_ids.iter().map(|id| libsql::Value::from(id.clone())));

        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        while let Some(row) = rows.next().await? {
            let subject_id: String = row.get(0)?;
            let status = match get_int::<u8>(&row, 1)? {
                2 => CompletionStatus::FinalApproved,
                1 => CompletionStatus::CourseApproved,
                _ => CompletionStatus::None,
            };
            statuses.insert(subject_id, status);
        }
        Ok(statuses)
    }

    /// Whether the student is `registered` on a non-cancelled board of the
    /// subject scheduled after `at`.
    pub async fn has_active_board_registration(
        &self,
        student_id: &str,
        subject_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT COUNT(*) FROM board_enrollments be
                 JOIN exam_boards b ON b.id = be.board_id
                 WHERE be.student_id = ?1 AND b.subject_id = ?2 AND be.status = ?3
                   AND b.cancelled = 0 AND b.exam_at > ?4",
                || {
                    libsql::params![
                        student_id,
                        subject_id,
                        BoardEnrollmentStatus::Registered.as_str(),
                        fmt_datetime(at)
                    ]
                },
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(get_int::<u32>(&row, 0)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use aula_core::enums::{BoardEnrollmentStatus, CompletionStatus, GradeStatus};
    use aula_core::outcomes::GradeEdit;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use crate::helpers::now;
    use crate::test_support::helpers::{seed_curriculum, seed_offering, test_service};

    #[tokio::test]
    async fn untouched_subjects_map_to_none() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let ids = vec![c.calculus_1.id.clone(), c.calculus_2.id.clone()];
        let statuses = svc.completions(&c.student.id, &ids).await.unwrap();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.values().all(|s| *s == CompletionStatus::None));
        assert!(svc.completions(&c.student.id, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_enrollment_is_not_an_approval() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let (_, offering) = seed_offering(&svc, &c.calc1_placement).await;
        let enrollment = svc.enroll_in_offering(&c.student.id, &offering.id).await.unwrap();
        svc.write_grades(&offering.id, &[GradeEdit::new(&enrollment.id, GradeStatus::Approved)])
            .await
            .unwrap();

        let ids = vec![c.calculus_1.id.clone()];
        let before = svc.completions(&c.student.id, &ids).await.unwrap();
        assert_eq!(before[&c.calculus_1.id], CompletionStatus::None);

        svc.mark_published(&offering.id, now()).await.unwrap();
        let after = svc.completions(&c.student.id, &ids).await.unwrap();
        assert_eq!(after[&c.calculus_1.id], CompletionStatus::CourseApproved);
    }

    #[tokio::test]
    async fn approved_final_outranks_course() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let board = svc
            .create_exam_board(&c.calculus_1.id, now() + Duration::days(5))
            .await
            .unwrap();
        let reg = svc.register_for_board(&c.student.id, &board.id).await.unwrap();
        assert!(svc
            .has_active_board_registration(&c.student.id, &c.calculus_1.id, now())
            .await
            .unwrap());

        svc.record_board_result(&reg.id, BoardEnrollmentStatus::Approved)
            .await
            .unwrap();
        assert!(!svc
            .has_active_board_registration(&c.student.id, &c.calculus_1.id, now())
            .await
            .unwrap());

        let ids = vec![c.calculus_1.id.clone()];
        let statuses = svc.completions(&c.student.id, &ids).await.unwrap();
        assert_eq!(statuses[&c.calculus_1.id], CompletionStatus::FinalApproved);
    }

    #[tokio::test]
    async fn registration_on_past_board_is_not_active() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let board = svc
            .create_exam_board(&c.calculus_1.id, now() - Duration::hours(1))
            .await
            .unwrap();
        svc.register_for_board(&c.student.id, &board.id).await.unwrap();
        assert!(!svc
            .has_active_board_registration(&c.student.id, &c.calculus_1.id, now())
            .await
            .unwrap());
    }
}
