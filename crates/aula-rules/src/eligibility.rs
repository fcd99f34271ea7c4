//! Eligibility Resolver.
//!
//! Answers "may this student take the course / sit the final of this
//! subject?" from the plan-scoped prerequisite graph and the student's
//! history. Verdicts are advisory: the insert that follows a positive verdict
//! is the actual authorization (see `EnrollmentLedger`).

use chrono::{DateTime, Utc};
use tracing::debug;

use aula_core::entities::Subject;
use aula_core::enums::{CompletionStatus, EntityType, PrerequisiteKind};
use aula_core::errors::RuleError;
use aula_core::outcomes::{EligibilityBlock, EligibilityVerdict, RequirementStatus};
use aula_core::ports::{AcademicHistory, PrerequisiteStore};

/// Read-only resolver over a prerequisite store and an academic history.
pub struct EligibilityResolver<'a, S> {
    store: &'a S,
}

impl<'a, S> EligibilityResolver<'a, S>
where
    S: PrerequisiteStore + AcademicHistory,
{
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Coursework eligibility: every `for_coursework` prerequisite must be
    /// course-approved.
    ///
    /// # Errors
    ///
    /// `NotFound` when the student does not exist or the subject is not part
    /// of the student's plan. `Storage` on infrastructure failure.
    pub async fn can_enroll_course(
        &self,
        student_id: &str,
        subject_id: &str,
    ) -> Result<EligibilityVerdict, RuleError> {
        let requirements = self
            .requirements(student_id, subject_id, PrerequisiteKind::ForCoursework)
            .await?;
        let verdict = EligibilityVerdict {
            student_id: student_id.to_string(),
            subject_id: subject_id.to_string(),
            kind: PrerequisiteKind::ForCoursework,
            eligible: requirements.iter().all(|r| r.fulfilled),
            requirements,
            blocked_by: None,
        };
        debug!(
            student_id,
            subject_id,
            eligible = verdict.eligible,
            unmet = verdict.unmet().count(),
            "course eligibility resolved"
        );
        Ok(verdict)
    }

    /// Final-exam eligibility: every `for_final` prerequisite must be both
    /// course- and final-approved, and the student must not already hold an
    /// active registration for this subject's final.
    ///
    /// # Errors
    ///
    /// Same as [`Self::can_enroll_course`].
    pub async fn can_enroll_final(
        &self,
        student_id: &str,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EligibilityVerdict, RuleError> {
        let requirements = self
            .requirements(student_id, subject_id, PrerequisiteKind::ForFinal)
            .await?;
        let blocked_by = self
            .store
            .has_active_board_registration(student_id, subject_id, now)
            .await?
            .then_some(EligibilityBlock::AlreadyRegistered);
        let verdict = EligibilityVerdict {
            student_id: student_id.to_string(),
            subject_id: subject_id.to_string(),
            kind: PrerequisiteKind::ForFinal,
            eligible: blocked_by.is_none() && requirements.iter().all(|r| r.fulfilled),
            requirements,
            blocked_by,
        };
        debug!(
            student_id,
            subject_id,
            eligible = verdict.eligible,
            blocked = verdict.blocked_by.is_some(),
            "final eligibility resolved"
        );
        Ok(verdict)
    }

    /// Direct prerequisites of `kind` joined against one batched history read.
    async fn requirements(
        &self,
        student_id: &str,
        subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<Vec<RequirementStatus>, RuleError> {
        let plan_id = self
            .store
            .student_plan(student_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::Student, student_id))?;

        if self.store.plan_subject(&plan_id, subject_id).await?.is_none() {
            return Err(RuleError::not_found(
                EntityType::PlanSubject,
                format!("{plan_id}/{subject_id}"),
            ));
        }

        let mut prerequisites = self
            .store
            .prerequisites_for(&plan_id, subject_id, kind)
            .await?;
        if prerequisites.is_empty() {
            return Ok(Vec::new());
        }
        prerequisites.sort_by(|a, b| a.code.cmp(&b.code));

        let ids: Vec<String> = prerequisites.iter().map(|s| s.id.clone()).collect();
        let completions = self.store.completions(student_id, &ids).await?;

        Ok(prerequisites
            .into_iter()
            .map(|subject| {
                let status = completions
                    .get(&subject.id)
                    .copied()
                    .unwrap_or(CompletionStatus::None);
                requirement(subject, status, kind)
            })
            .collect())
    }
}

fn requirement(
    subject: Subject,
    status: CompletionStatus,
    kind: PrerequisiteKind,
) -> RequirementStatus {
    let course_approved = status.course_approved();
    let final_approved = status.final_approved();
    let fulfilled = match kind {
        PrerequisiteKind::ForCoursework => course_approved,
        PrerequisiteKind::ForFinal => course_approved && final_approved,
    };
    RequirementStatus {
        subject_id: subject.id,
        subject_code: subject.code,
        subject_name: subject.name,
        fulfilled,
        course_approved,
        final_approved,
    }
}
