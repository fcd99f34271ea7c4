//! Orchestration facade.
//!
//! Every entry point a host application exposes goes through [`Registrar`],
//! which resolves the caller, runs the shared rule components, commits, and
//! audits. Each operation returns an [`Outcome`]; no raw error crosses this
//! boundary.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use aula_config::NotificationConfig;
use aula_core::audit_detail::{
    AssignmentDetail, GradeDraftedDetail, GradesSavedDetail, PublishedDetail,
};
use aula_core::entities::{
    BoardEnrollment, CourseEnrollment, CourseOffering, GradeRecord, PrerequisiteEdge,
    TeacherAssignment,
};
use aula_core::enums::{AuditAction, EntityType, GradeStatus, PrerequisiteKind};
use aula_core::errors::{ErrorKind, RuleError};
use aula_core::identity::IdentityProvider;
use aula_core::outcomes::{
    EligibilityVerdict, GradeEdit, GradeSummary, Outcome, PublishReport, SaveReport,
    UnassignReport,
};
use aula_core::ports::{AcademicStore, Notifier};

use crate::capacity::CapacityGuard;
use crate::eligibility::EligibilityResolver;
use crate::grades::GradeLifecycle;
use crate::notify::LogNotifier;

/// Request-scoped facade over one backing store.
///
/// The store and notifier are shared; the identity belongs to the request.
/// Use [`Registrar::for_identity`] to serve another caller from the same store.
pub struct Registrar<S, I, N = LogNotifier> {
    store: Arc<S>,
    identity: I,
    notifier: Arc<N>,
    notifications_enabled: bool,
}

impl<S, I, N> Registrar<S, I, N>
where
    S: AcademicStore,
    I: IdentityProvider,
    N: Notifier,
{
    pub const fn new(store: Arc<S>, identity: I, notifier: Arc<N>) -> Self {
        Self {
            store,
            identity,
            notifier,
            notifications_enabled: true,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &NotificationConfig) -> Self {
        self.notifications_enabled = config.enabled;
        self
    }

    /// Same store, notifier, and settings; different caller.
    pub fn for_identity<J: IdentityProvider>(&self, identity: J) -> Registrar<S, J, N> {
        Registrar {
            store: Arc::clone(&self.store),
            identity,
            notifier: Arc::clone(&self.notifier),
            notifications_enabled: self.notifications_enabled,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Eligibility and enrollment
    // -----------------------------------------------------------------------

    pub async fn check_course_eligibility(&self, subject_id: &str) -> Outcome<EligibilityVerdict> {
        let result: Result<EligibilityVerdict, RuleError> = async {
            let student_id = self.student()?;
            self.resolver()
                .can_enroll_course(&student_id, subject_id)
                .await
        }
        .await;
        finish("check_course_eligibility", result)
    }

    pub async fn check_final_eligibility(&self, subject_id: &str) -> Outcome<EligibilityVerdict> {
        let result: Result<EligibilityVerdict, RuleError> = async {
            let student_id = self.student()?;
            self.resolver()
                .can_enroll_final(&student_id, subject_id, Utc::now())
                .await
        }
        .await;
        finish("check_final_eligibility", result)
    }

    /// Enroll the current student in a course offering.
    ///
    /// The eligibility verdict is advisory; the unique `(student, offering)`
    /// constraint decides between concurrent requests.
    pub async fn enroll_course(&self, offering_id: &str) -> Outcome<CourseEnrollment> {
        finish("enroll_course", self.try_enroll_course(offering_id).await)
    }

    async fn try_enroll_course(&self, offering_id: &str) -> Result<CourseEnrollment, RuleError> {
        let student_id = self.student()?;
        let offering = self.grades().offering(offering_id).await?;
        if offering.published {
            return Err(RuleError::ImmutableState {
                offering_id: offering.id,
            });
        }
        let verdict = self
            .resolver()
            .can_enroll_course(&student_id, &offering.subject_id)
            .await?;
        if !verdict.eligible {
            return Err(RuleError::Ineligible(Box::new(verdict)));
        }

        let enrollment = self
            .store
            .insert_course_enrollment(&student_id, offering_id)
            .await?;
        info!(
            enrollment_id = %enrollment.id,
            student_id = %student_id,
            offering_id,
            "enrolled in course"
        );
        self.audit(EntityType::CourseEnrollment, &enrollment.id, AuditAction::Enrolled, None)
            .await;
        Ok(enrollment)
    }

    /// Register the current student for a final exam board.
    pub async fn enroll_final(&self, board_id: &str) -> Outcome<BoardEnrollment> {
        finish("enroll_final", self.try_enroll_final(board_id).await)
    }

    async fn try_enroll_final(&self, board_id: &str) -> Result<BoardEnrollment, RuleError> {
        let student_id = self.student()?;
        let now = Utc::now();
        let board = self
            .store
            .exam_board(board_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::ExamBoard, board_id))?;
        if !board.is_open_at(now) {
            return Err(RuleError::Validation(format!(
                "exam board {board_id} is closed"
            )));
        }
        let verdict = self
            .resolver()
            .can_enroll_final(&student_id, &board.subject_id, now)
            .await?;
        if !verdict.eligible {
            return Err(RuleError::Ineligible(Box::new(verdict)));
        }

        let enrollment = self
            .store
            .insert_board_enrollment(&student_id, board_id)
            .await?;
        info!(
            board_enrollment_id = %enrollment.id,
            student_id = %student_id,
            board_id,
            "registered for final"
        );
        self.audit(EntityType::BoardEnrollment, &enrollment.id, AuditAction::Enrolled, None)
            .await;
        Ok(enrollment)
    }

    // -----------------------------------------------------------------------
    // Prerequisite graph
    // -----------------------------------------------------------------------

    /// Add an edge `subject` requires `required_subject` within `plan`.
    ///
    /// Cycles are not detected; resolution only reads direct prerequisites.
    pub async fn add_prerequisite(
        &self,
        plan_id: &str,
        subject_id: &str,
        required_subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Outcome<PrerequisiteEdge> {
        let result: Result<PrerequisiteEdge, RuleError> = async {
            if subject_id == required_subject_id {
                return Err(RuleError::Validation(format!(
                    "subject {subject_id} cannot require itself"
                )));
            }
            for id in [subject_id, required_subject_id] {
                if self.store.plan_subject(plan_id, id).await?.is_none() {
                    return Err(RuleError::not_found(
                        EntityType::PlanSubject,
                        format!("{plan_id}/{id}"),
                    ));
                }
            }
            let edge = self
                .store
                .insert_prerequisite(plan_id, subject_id, required_subject_id, kind)
                .await?;
            info!(
                edge_id = %edge.id,
                plan_id,
                subject_id,
                required_subject_id,
                %kind,
                "prerequisite added"
            );
            self.audit(EntityType::Prerequisite, &edge.id, AuditAction::Created, None)
                .await;
            Ok(edge)
        }
        .await;
        finish("add_prerequisite", result)
    }

    pub async fn remove_prerequisite(&self, edge_id: &str) -> Outcome<()> {
        let result: Result<(), RuleError> = async {
            self.store.delete_prerequisite(edge_id).await?;
            info!(edge_id, "prerequisite removed");
            self.audit(EntityType::Prerequisite, edge_id, AuditAction::Deleted, None)
                .await;
            Ok(())
        }
        .await;
        finish("remove_prerequisite", result)
    }

    // -----------------------------------------------------------------------
    // Capacity and dependencies
    // -----------------------------------------------------------------------

    pub async fn assign_teacher(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Outcome<TeacherAssignment> {
        let result: Result<TeacherAssignment, RuleError> = async {
            self.guard().check_assignment(teacher_id, subject_id).await?;
            let assignment = self.store.insert_assignment(teacher_id, subject_id).await?;
            info!(assignment_id = %assignment.id, teacher_id, subject_id, "teacher assigned");
            self.audit(
                EntityType::TeacherAssignment,
                &assignment.id,
                AuditAction::Assigned,
                detail(&AssignmentDetail {
                    teacher_id: teacher_id.to_string(),
                    subject_id: subject_id.to_string(),
                }),
            )
            .await;
            Ok(assignment)
        }
        .await;
        finish("assign_teacher", result)
    }

    /// Remove an assignment. Removing a teacher's last assignment also
    /// deactivates the teacher role.
    pub async fn unassign_teacher(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Outcome<UnassignReport> {
        finish(
            "unassign_teacher",
            self.try_unassign_teacher(teacher_id, subject_id).await,
        )
    }

    async fn try_unassign_teacher(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<UnassignReport, RuleError> {
        let assignment = self
            .guard()
            .can_unassign_teacher(teacher_id, subject_id, Utc::now())
            .await?;
        let remaining = self.store.delete_assignment(teacher_id, subject_id).await?;
        let role_deactivated = remaining == 0;
        info!(teacher_id, subject_id, remaining, role_deactivated, "teacher unassigned");

        self.audit(
            EntityType::TeacherAssignment,
            &assignment.id,
            AuditAction::Unassigned,
            detail(&AssignmentDetail {
                teacher_id: teacher_id.to_string(),
                subject_id: subject_id.to_string(),
            }),
        )
        .await;
        if role_deactivated {
            self.audit(EntityType::Teacher, teacher_id, AuditAction::RoleDeactivated, None)
                .await;
        }
        Ok(UnassignReport {
            teacher_id: teacher_id.to_string(),
            subject_id: subject_id.to_string(),
            role_deactivated,
        })
    }

    pub async fn remove_plan_subject(&self, plan_subject_id: &str) -> Outcome<()> {
        let result: Result<(), RuleError> = async {
            self.guard().can_remove_plan_subject(plan_subject_id).await?;
            self.store.delete_plan_subject(plan_subject_id).await?;
            info!(plan_subject_id, "plan subject removed");
            self.audit(EntityType::PlanSubject, plan_subject_id, AuditAction::Deleted, None)
                .await;
            Ok(())
        }
        .await;
        finish("remove_plan_subject", result)
    }

    pub async fn remove_career(&self, career_id: &str) -> Outcome<()> {
        let result: Result<(), RuleError> = async {
            self.guard().can_remove_career(career_id).await?;
            self.store.delete_career(career_id).await?;
            info!(career_id, "career removed");
            self.audit(EntityType::Career, career_id, AuditAction::Deleted, None)
                .await;
            Ok(())
        }
        .await;
        finish("remove_career", result)
    }

    // -----------------------------------------------------------------------
    // Grades (current teacher only)
    // -----------------------------------------------------------------------

    pub async fn set_grade(
        &self,
        enrollment_id: &str,
        status: GradeStatus,
    ) -> Outcome<GradeRecord> {
        finish("set_grade", self.try_set_grade(enrollment_id, status).await)
    }

    async fn try_set_grade(
        &self,
        enrollment_id: &str,
        status: GradeStatus,
    ) -> Result<GradeRecord, RuleError> {
        let teacher_id = self.teacher()?;
        let current = self
            .store
            .grade_record(enrollment_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::GradeRecord, enrollment_id))?;
        self.owned_offering(&current.offering_id, &teacher_id).await?;

        let staged = self.grades().set_grade(enrollment_id, status).await?;
        self.audit(
            EntityType::GradeRecord,
            enrollment_id,
            AuditAction::GradeDrafted,
            detail(&GradeDraftedDetail {
                offering_id: current.offering_id.clone(),
                from: current.draft_status.unwrap_or(current.status),
                to: status,
            }),
        )
        .await;
        Ok(staged)
    }

    pub async fn save_grades(&self, offering_id: &str, edits: &[GradeEdit]) -> Outcome<SaveReport> {
        let result: Result<SaveReport, RuleError> = async {
            let teacher_id = self.teacher()?;
            self.owned_offering(offering_id, &teacher_id).await?;
            let report = self.grades().save_grades(offering_id, edits).await?;
            self.audit(
                EntityType::CourseOffering,
                offering_id,
                AuditAction::GradesSaved,
                detail(&GradesSavedDetail {
                    records: u32::try_from(report.saved.len()).unwrap_or(u32::MAX),
                }),
            )
            .await;
            Ok(report)
        }
        .await;
        finish("save_grades", result)
    }

    pub async fn grade_summary(&self, offering_id: &str) -> Outcome<GradeSummary> {
        let result: Result<GradeSummary, RuleError> = async {
            let teacher_id = self.teacher()?;
            self.owned_offering(offering_id, &teacher_id).await?;
            self.grades().summary(offering_id).await
        }
        .await;
        finish("grade_summary", result)
    }

    /// Publish the offering's grades. Repeating the call is a successful
    /// no-op that does not notify again.
    pub async fn publish(&self, offering_id: &str) -> Outcome<PublishReport> {
        finish("publish", self.try_publish(offering_id).await)
    }

    async fn try_publish(&self, offering_id: &str) -> Result<PublishReport, RuleError> {
        let teacher_id = self.teacher()?;
        self.owned_offering(offering_id, &teacher_id).await?;

        let report = if self.notifications_enabled {
            GradeLifecycle::with_notifier(self.store.as_ref(), self.notifier.as_ref())
                .publish(offering_id, Utc::now())
                .await?
        } else {
            self.grades().publish(offering_id, Utc::now()).await?
        };

        if report.newly_published {
            let summary = self.grades().summary(offering_id).await?;
            self.audit(
                EntityType::CourseOffering,
                offering_id,
                AuditAction::Published,
                detail(&PublishedDetail {
                    approved: summary.approved,
                    failed: summary.failed,
                    absent: summary.absent,
                }),
            )
            .await;
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn resolver(&self) -> EligibilityResolver<'_, S> {
        EligibilityResolver::new(self.store.as_ref())
    }

    fn guard(&self) -> CapacityGuard<'_, S> {
        CapacityGuard::new(self.store.as_ref())
    }

    fn grades(&self) -> GradeLifecycle<'_, S, LogNotifier> {
        GradeLifecycle::new(self.store.as_ref())
    }

    fn student(&self) -> Result<String, RuleError> {
        self.identity
            .current_student()
            .ok_or_else(|| RuleError::Unauthorized("no student in session".into()))
    }

    fn teacher(&self) -> Result<String, RuleError> {
        self.identity
            .current_teacher()
            .ok_or_else(|| RuleError::Unauthorized("no teacher in session".into()))
    }

    async fn owned_offering(
        &self,
        offering_id: &str,
        teacher_id: &str,
    ) -> Result<CourseOffering, RuleError> {
        let offering = self.grades().offering(offering_id).await?;
        if offering.teacher_id != teacher_id {
            return Err(RuleError::Unauthorized(format!(
                "offering {offering_id} belongs to another teacher"
            )));
        }
        Ok(offering)
    }

    /// Append to the audit trail. The mutation is already committed, so a
    /// failed append is only logged.
    async fn audit(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<Value>,
    ) {
        let actor = self
            .identity
            .current_teacher()
            .or_else(|| self.identity.current_student());
        if let Err(e) = self
            .store
            .record(actor.as_deref(), entity_type, entity_id, action, detail)
            .await
        {
            warn!(%entity_type, entity_id, %action, error = %e, "audit append failed");
        }
    }
}

fn detail<T: serde::Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

fn finish<T>(operation: &'static str, result: Result<T, RuleError>) -> Outcome<T> {
    if let Err(e) = &result {
        match e.kind() {
            ErrorKind::Storage => error!(operation, error = %e, "storage failure"),
            kind => debug!(operation, %kind, error = %e, "operation rejected"),
        }
    }
    result.into()
}
