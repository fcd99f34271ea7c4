//! Adapter ports the engine consumes.
//!
//! The rule crates never talk to a database directly. They depend on these
//! traits, implemented by `aula-db` for libSQL. Reads return typed entities;
//! writes rely on storage-level constraints as the final authority, so a write
//! can still fail with `StoreError::Conflict` / `CapacityExceeded` /
//! `Immutable` after a passing pre-check.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    BoardEnrollment, Career, CourseEnrollment, CourseOffering, ExamBoard, GradeRecord,
    PlanSubject, PrerequisiteEdge, Student, Subject, Teacher, TeacherAssignment,
};
use crate::enums::{AuditAction, CompletionStatus, EntityType, GradeStatus, PrerequisiteKind};
use crate::errors::StoreError;
use crate::outcomes::GradeEdit;

/// Plan-scoped prerequisite graph.
#[async_trait]
pub trait PrerequisiteStore: Send + Sync {
    /// Placement of `subject_id` in `plan_id`, if the plan contains it.
    async fn plan_subject(
        &self,
        plan_id: &str,
        subject_id: &str,
    ) -> Result<Option<PlanSubject>, StoreError>;

    /// Direct prerequisites of `subject_id` of the given kind. Empty when none exist.
    async fn prerequisites_for(
        &self,
        plan_id: &str,
        subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<Vec<Subject>, StoreError>;

    async fn insert_prerequisite(
        &self,
        plan_id: &str,
        subject_id: &str,
        required_subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<PrerequisiteEdge, StoreError>;

    async fn delete_prerequisite(&self, edge_id: &str) -> Result<(), StoreError>;
}

/// A student's academic record.
#[async_trait]
pub trait AcademicHistory: Send + Sync {
    async fn student(&self, student_id: &str) -> Result<Option<Student>, StoreError>;

    /// Study plan of the student's career.
    async fn student_plan(&self, student_id: &str) -> Result<Option<String>, StoreError>;

    /// Completion status for each of `subject_ids`, fetched in one batch.
    /// Subjects without any record map to `CompletionStatus::None` or are absent.
    async fn completions(
        &self,
        student_id: &str,
        subject_ids: &[String],
    ) -> Result<HashMap<String, CompletionStatus>, StoreError>;

    /// Whether the student is registered on a non-cancelled board of the
    /// subject that takes place after `now`.
    async fn has_active_board_registration(
        &self,
        student_id: &str,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Counts and deletions behind the capacity and dependency guards.
#[async_trait]
pub trait CapacityStore: Send + Sync {
    async fn subject(&self, subject_id: &str) -> Result<Option<Subject>, StoreError>;

    async fn teacher(&self, teacher_id: &str) -> Result<Option<Teacher>, StoreError>;

    async fn assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<Option<TeacherAssignment>, StoreError>;

    async fn assignment_count(&self, subject_id: &str) -> Result<u32, StoreError>;

    async fn plan_subject_by_id(
        &self,
        plan_subject_id: &str,
    ) -> Result<Option<PlanSubject>, StoreError>;

    /// Course enrollments of any status under offerings of the placement.
    async fn enrollment_count_for_plan_subject(
        &self,
        plan_subject_id: &str,
    ) -> Result<u32, StoreError>;

    /// Prerequisite edges of the placement's plan that require its subject.
    async fn prerequisite_dependents_of_plan_subject(
        &self,
        plan_subject_id: &str,
    ) -> Result<u32, StoreError>;

    async fn career(&self, career_id: &str) -> Result<Option<Career>, StoreError>;

    async fn active_student_count(&self, career_id: &str) -> Result<u32, StoreError>;

    /// Whether the teacher sits on a non-cancelled board of the subject after `now`.
    async fn has_upcoming_board_seat(
        &self,
        teacher_id: &str,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn insert_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<TeacherAssignment, StoreError>;

    /// Remove the assignment and return how many assignments the teacher has
    /// left. When none remain, the teacher role is deactivated in the same
    /// transaction.
    async fn delete_assignment(&self, teacher_id: &str, subject_id: &str)
    -> Result<u32, StoreError>;

    async fn delete_plan_subject(&self, plan_subject_id: &str) -> Result<(), StoreError>;

    async fn delete_career(&self, career_id: &str) -> Result<(), StoreError>;
}

/// Enrollment commits.
#[async_trait]
pub trait EnrollmentLedger: Send + Sync {
    async fn exam_board(&self, board_id: &str) -> Result<Option<ExamBoard>, StoreError>;

    /// Insert the enrollment and its `ungraded` grade record atomically.
    async fn insert_course_enrollment(
        &self,
        student_id: &str,
        offering_id: &str,
    ) -> Result<CourseEnrollment, StoreError>;

    async fn insert_board_enrollment(
        &self,
        student_id: &str,
        board_id: &str,
    ) -> Result<BoardEnrollment, StoreError>;
}

/// Per-offering grade records.
#[async_trait]
pub trait GradeStore: Send + Sync {
    async fn offering(&self, offering_id: &str) -> Result<Option<CourseOffering>, StoreError>;

    async fn grade_record(&self, enrollment_id: &str) -> Result<Option<GradeRecord>, StoreError>;

    async fn grade_records(&self, offering_id: &str) -> Result<Vec<GradeRecord>, StoreError>;

    /// Record an unsaved edit on one grade record.
    async fn stage_grade(
        &self,
        enrollment_id: &str,
        status: GradeStatus,
    ) -> Result<GradeRecord, StoreError>;

    /// Atomically write `edits` and every outstanding draft of the offering as
    /// saved statuses. Explicit edits win over drafts. Returns the enrollment
    /// ids written.
    async fn write_grades(
        &self,
        offering_id: &str,
        edits: &[GradeEdit],
    ) -> Result<Vec<String>, StoreError>;

    /// Set the terminal published flag and settle enrollment statuses.
    /// Returns `false` when the offering was already published, and
    /// `StoreError::NotReady` when a record is ungraded or unsaved at commit.
    async fn mark_published(
        &self,
        offering_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Append-only record of committed mutations.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(
        &self,
        actor_id: Option<&str>,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<serde_json::Value>,
    ) -> Result<(), StoreError>;
}

/// Everything the orchestration layer needs from one backing store.
pub trait AcademicStore:
    PrerequisiteStore
    + AcademicHistory
    + CapacityStore
    + EnrollmentLedger
    + GradeStore
    + AuditLog
{
}

impl<T> AcademicStore for T where
    T: PrerequisiteStore
        + AcademicHistory
        + CapacityStore
        + EnrollmentLedger
        + GradeStore
        + AuditLog
{
}

/// Fire-and-forget dispatch of the publish notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn grades_published(
        &self,
        offering: &CourseOffering,
        student_ids: &[String],
    ) -> anyhow::Result<()>;
}
