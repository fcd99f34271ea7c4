//! `aula-core` port implementations for `AulaService`.
//!
//! Thin adapters over the repo methods: `NoResult` lookups become `None`,
//! `DatabaseError` becomes `StoreError`.

use std::collections::HashMap;

use async_trait::async_trait;
use aula_core::entities::{
    BoardEnrollment, Career, CourseEnrollment, CourseOffering, ExamBoard, GradeRecord,
    PlanSubject, PrerequisiteEdge, Student, Subject, Teacher, TeacherAssignment,
};
use aula_core::enums::{AuditAction, CompletionStatus, EntityType, GradeStatus, PrerequisiteKind};
use aula_core::errors::StoreError;
use aula_core::outcomes::GradeEdit;
use aula_core::ports::{
    AcademicHistory, AuditLog, CapacityStore, EnrollmentLedger, GradeStore, PrerequisiteStore,
};
use chrono::{DateTime, Utc};

use crate::helpers::OptionalExt;
use crate::service::AulaService;

#[async_trait]
impl PrerequisiteStore for AulaService {
    async fn plan_subject(
        &self,
        plan_id: &str,
        subject_id: &str,
    ) -> Result<Option<PlanSubject>, StoreError> {
        Ok(self.find_plan_subject(plan_id, subject_id).await.optional()?)
    }

    async fn prerequisites_for(
        &self,
        plan_id: &str,
        subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<Vec<Subject>, StoreError> {
        Ok(self.list_prerequisites(plan_id, subject_id, kind).await?)
    }

    async fn insert_prerequisite(
        &self,
        plan_id: &str,
        subject_id: &str,
        required_subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<PrerequisiteEdge, StoreError> {
        Ok(self
            .create_prerequisite(plan_id, subject_id, required_subject_id, kind)
            .await?)
    }

    async fn delete_prerequisite(&self, edge_id: &str) -> Result<(), StoreError> {
        Ok(Self::delete_prerequisite(self, edge_id).await?)
    }
}

#[async_trait]
impl AcademicHistory for AulaService {
    async fn student(&self, student_id: &str) -> Result<Option<Student>, StoreError> {
        Ok(self.get_student(student_id).await.optional()?)
    }

    async fn student_plan(&self, student_id: &str) -> Result<Option<String>, StoreError> {
        Ok(Self::student_plan(self, student_id).await.optional()?)
    }

    async fn completions(
        &self,
        student_id: &str,
        subject_ids: &[String],
    ) -> Result<HashMap<String, CompletionStatus>, StoreError> {
        Ok(Self::completions(self, student_id, subject_ids).await?)
    }

    async fn has_active_board_registration(
        &self,
        student_id: &str,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(Self::has_active_board_registration(self, student_id, subject_id, now).await?)
    }
}

#[async_trait]
impl CapacityStore for AulaService {
    async fn subject(&self, subject_id: &str) -> Result<Option<Subject>, StoreError> {
        Ok(self.get_subject(subject_id).await.optional()?)
    }

    async fn teacher(&self, teacher_id: &str) -> Result<Option<Teacher>, StoreError> {
        Ok(self.get_teacher(teacher_id).await.optional()?)
    }

    async fn assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<Option<TeacherAssignment>, StoreError> {
        Ok(self.get_assignment(teacher_id, subject_id).await.optional()?)
    }

    async fn assignment_count(&self, subject_id: &str) -> Result<u32, StoreError> {
        Ok(self.count_assignments_for_subject(subject_id).await?)
    }

    async fn plan_subject_by_id(
        &self,
        plan_subject_id: &str,
    ) -> Result<Option<PlanSubject>, StoreError> {
        Ok(self.get_plan_subject(plan_subject_id).await.optional()?)
    }

    async fn enrollment_count_for_plan_subject(
        &self,
        plan_subject_id: &str,
    ) -> Result<u32, StoreError> {
        Ok(self.count_enrollments_for_plan_subject(plan_subject_id).await?)
    }

    async fn prerequisite_dependents_of_plan_subject(
        &self,
        plan_subject_id: &str,
    ) -> Result<u32, StoreError> {
        Ok(self.count_prerequisite_dependents(plan_subject_id).await?)
    }

    async fn career(&self, career_id: &str) -> Result<Option<Career>, StoreError> {
        Ok(self.get_career(career_id).await.optional()?)
    }

    async fn active_student_count(&self, career_id: &str) -> Result<u32, StoreError> {
        Ok(Self::active_student_count(self, career_id).await?)
    }

    async fn has_upcoming_board_seat(
        &self,
        teacher_id: &str,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(Self::has_upcoming_board_seat(self, teacher_id, subject_id, now).await?)
    }

    async fn insert_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<TeacherAssignment, StoreError> {
        Ok(self.create_assignment(teacher_id, subject_id).await?)
    }

    async fn delete_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<u32, StoreError> {
        Ok(Self::delete_assignment(self, teacher_id, subject_id).await?)
    }

    async fn delete_plan_subject(&self, plan_subject_id: &str) -> Result<(), StoreError> {
        Ok(Self::delete_plan_subject(self, plan_subject_id).await?)
    }

    async fn delete_career(&self, career_id: &str) -> Result<(), StoreError> {
        Ok(Self::delete_career(self, career_id).await?)
    }
}

#[async_trait]
impl EnrollmentLedger for AulaService {
    async fn exam_board(&self, board_id: &str) -> Result<Option<ExamBoard>, StoreError> {
        Ok(self.get_exam_board(board_id).await.optional()?)
    }

    async fn insert_course_enrollment(
        &self,
        student_id: &str,
        offering_id: &str,
    ) -> Result<CourseEnrollment, StoreError> {
        Ok(self.enroll_in_offering(student_id, offering_id).await?)
    }

    async fn insert_board_enrollment(
        &self,
        student_id: &str,
        board_id: &str,
    ) -> Result<BoardEnrollment, StoreError> {
        Ok(self.register_for_board(student_id, board_id).await?)
    }
}

#[async_trait]
impl GradeStore for AulaService {
    async fn offering(&self, offering_id: &str) -> Result<Option<CourseOffering>, StoreError> {
        Ok(self.get_offering(offering_id).await.optional()?)
    }

    async fn grade_record(&self, enrollment_id: &str) -> Result<Option<GradeRecord>, StoreError> {
        Ok(self.get_grade_record(enrollment_id).await.optional()?)
    }

    async fn grade_records(&self, offering_id: &str) -> Result<Vec<GradeRecord>, StoreError> {
        Ok(self.list_grade_records(offering_id).await?)
    }

    async fn stage_grade(
        &self,
        enrollment_id: &str,
        status: GradeStatus,
    ) -> Result<GradeRecord, StoreError> {
        Ok(Self::stage_grade(self, enrollment_id, status).await?)
    }

    async fn write_grades(
        &self,
        offering_id: &str,
        edits: &[GradeEdit],
    ) -> Result<Vec<String>, StoreError> {
        Ok(Self::write_grades(self, offering_id, edits).await?)
    }

    async fn mark_published(
        &self,
        offering_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(Self::mark_published(self, offering_id, at).await?)
    }
}

#[async_trait]
impl AuditLog for AulaService {
    async fn record(
        &self,
        actor_id: Option<&str>,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<serde_json::Value>,
    ) -> Result<(), StoreError> {
        self.record_audit(actor_id, entity_type, entity_id, action, detail)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use aula_core::enums::{CompletionStatus, EntityType, PrerequisiteKind};
    use aula_core::errors::StoreError;
    use aula_core::ports::{AcademicHistory, CapacityStore, GradeStore, PrerequisiteStore};

    use crate::test_support::helpers::{seed_curriculum, test_service};

    #[tokio::test]
    async fn missing_rows_become_none() {
        let svc = test_service().await;
        assert!(AcademicHistory::student(&svc, "stu-missing").await.unwrap().is_none());
        assert!(AcademicHistory::student_plan(&svc, "stu-missing").await.unwrap().is_none());
        assert!(GradeStore::offering(&svc, "off-missing").await.unwrap().is_none());
        assert!(CapacityStore::career(&svc, "car-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn constraint_failures_arrive_as_store_errors() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        PrerequisiteStore::insert_prerequisite(
            &svc,
            &c.plan.id,
            &c.calculus_2.id,
            &c.calculus_1.id,
            PrerequisiteKind::ForCoursework,
        )
        .await
        .unwrap();
        let err = PrerequisiteStore::insert_prerequisite(
            &svc,
            &c.plan.id,
            &c.calculus_2.id,
            &c.calculus_1.id,
            PrerequisiteKind::ForCoursework,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

        let err = CapacityStore::delete_career(&svc, "car-missing").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound { entity_type: EntityType::Career, .. }
        ));
    }

    #[tokio::test]
    async fn completions_cover_every_requested_subject() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let ids = vec![c.calculus_1.id.clone()];
        let statuses = AcademicHistory::completions(&svc, &c.student.id, &ids)
            .await
            .unwrap();
        assert_eq!(statuses.get(&c.calculus_1.id), Some(&CompletionStatus::None));
    }
}
