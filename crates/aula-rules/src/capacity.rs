//! Capacity Guard.
//!
//! Pure predicates over current state. None of them lock anything; the write
//! that follows is re-validated by storage constraints.

use chrono::{DateTime, Utc};
use tracing::debug;

use aula_core::MAX_TEACHERS_PER_SUBJECT;
use aula_core::entities::{Career, PlanSubject, TeacherAssignment};
use aula_core::enums::EntityType;
use aula_core::errors::RuleError;
use aula_core::ports::CapacityStore;

pub struct CapacityGuard<'a, S> {
    store: &'a S,
}

impl<'a, S: CapacityStore> CapacityGuard<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Whether `subject_id` is below the teacher cap.
    ///
    /// # Errors
    ///
    /// `Storage` on infrastructure failure.
    pub async fn has_capacity(&self, subject_id: &str) -> Result<bool, RuleError> {
        let count = self.store.assignment_count(subject_id).await?;
        Ok(count < MAX_TEACHERS_PER_SUBJECT)
    }

    /// Full pre-check for assigning `teacher_id` to `subject_id`.
    ///
    /// A repeated assignment is reported as `AlreadyAssigned` before the cap
    /// is looked at.
    ///
    /// # Errors
    ///
    /// `NotFound`, `AlreadyAssigned`, `CapacityExceeded`, or `Storage`.
    pub async fn check_assignment(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<(), RuleError> {
        if self.store.subject(subject_id).await?.is_none() {
            return Err(RuleError::not_found(EntityType::Subject, subject_id));
        }
        if self.store.teacher(teacher_id).await?.is_none() {
            return Err(RuleError::not_found(EntityType::Teacher, teacher_id));
        }
        if self.store.assignment(teacher_id, subject_id).await?.is_some() {
            return Err(RuleError::AlreadyAssigned {
                teacher_id: teacher_id.to_string(),
                subject_id: subject_id.to_string(),
            });
        }
        let count = self.store.assignment_count(subject_id).await?;
        debug!(teacher_id, subject_id, count, "assignment capacity checked");
        if count >= MAX_TEACHERS_PER_SUBJECT {
            return Err(RuleError::CapacityExceeded {
                subject_id: subject_id.to_string(),
                limit: MAX_TEACHERS_PER_SUBJECT,
            });
        }
        Ok(())
    }

    /// A placement may go only while no enrollment of any status hangs off
    /// its offerings and no prerequisite edge of its plan requires its
    /// subject. Edges the placement itself declares go with it.
    ///
    /// # Errors
    ///
    /// `NotFound`, `HasDependents`, or `Storage`.
    pub async fn can_remove_plan_subject(
        &self,
        plan_subject_id: &str,
    ) -> Result<PlanSubject, RuleError> {
        let placement = self
            .store
            .plan_subject_by_id(plan_subject_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::PlanSubject, plan_subject_id))?;
        let enrollments = self
            .store
            .enrollment_count_for_plan_subject(plan_subject_id)
            .await?;
        let edges = self
            .store
            .prerequisite_dependents_of_plan_subject(plan_subject_id)
            .await?;
        debug!(plan_subject_id, enrollments, edges, "plan subject removal checked");
        if enrollments + edges > 0 {
            return Err(RuleError::HasDependents {
                entity_type: EntityType::PlanSubject,
                id: plan_subject_id.to_string(),
                dependents: enrollments + edges,
            });
        }
        Ok(placement)
    }

    /// # Errors
    ///
    /// `NotFound`, `HasActiveStudents`, or `Storage`.
    pub async fn can_remove_career(&self, career_id: &str) -> Result<Career, RuleError> {
        let career = self
            .store
            .career(career_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::Career, career_id))?;
        let count = self.store.active_student_count(career_id).await?;
        debug!(career_id, count, "career removal checked");
        if count > 0 {
            return Err(RuleError::HasActiveStudents {
                career_id: career_id.to_string(),
                count,
            });
        }
        Ok(career)
    }

    /// The assignment must exist and the teacher must not sit on a board of
    /// the subject scheduled after `now`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `HasActiveExamBoard`, or `Storage`.
    pub async fn can_unassign_teacher(
        &self,
        teacher_id: &str,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TeacherAssignment, RuleError> {
        let assignment = self
            .store
            .assignment(teacher_id, subject_id)
            .await?
            .ok_or_else(|| {
                RuleError::not_found(
                    EntityType::TeacherAssignment,
                    format!("{teacher_id}/{subject_id}"),
                )
            })?;
        if self
            .store
            .has_upcoming_board_seat(teacher_id, subject_id, now)
            .await?
        {
            return Err(RuleError::HasActiveExamBoard {
                teacher_id: teacher_id.to_string(),
                subject_id: subject_id.to_string(),
            });
        }
        Ok(assignment)
    }
}
