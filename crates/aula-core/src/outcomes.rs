//! Result-style outcomes and report types handed to the UI/orchestration layer.
//!
//! These structs define the JSON shape of everything the engine exposes:
//! eligibility verdicts, grade summaries, batch save reports, and the
//! `{success, ...}` envelope wrapping every operation.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{GradeStatus, PrerequisiteKind};
use crate::errors::{ErrorKind, RuleError};

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Fulfilment of one prerequisite inside a verdict.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RequirementStatus {
    pub subject_id: String,
    pub subject_code: String,
    pub subject_name: String,
    pub fulfilled: bool,
    pub course_approved: bool,
    pub final_approved: bool,
}

/// Why a verdict is negative independently of its requirement list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityBlock {
    /// The student already holds an active registration for the subject's final.
    AlreadyRegistered,
}

/// Immutable answer to "may this student enroll?".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EligibilityVerdict {
    pub student_id: String,
    pub subject_id: String,
    pub kind: PrerequisiteKind,
    pub eligible: bool,
    pub requirements: Vec<RequirementStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<EligibilityBlock>,
}

impl EligibilityVerdict {
    /// Prerequisites the student still lacks.
    pub fn unmet(&self) -> impl Iterator<Item = &RequirementStatus> {
        self.requirements.iter().filter(|r| !r.fulfilled)
    }
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

/// One grade edit inside a batch save.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GradeEdit {
    pub enrollment_id: String,
    pub status: GradeStatus,
}

impl GradeEdit {
    #[must_use]
    pub fn new(enrollment_id: impl Into<String>, status: GradeStatus) -> Self {
        Self {
            enrollment_id: enrollment_id.into(),
            status,
        }
    }
}

/// A record that could not be written in a batch save.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GradeWriteFailure {
    pub enrollment_id: String,
    pub reason: String,
}

/// Result of a successful batch save.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SaveReport {
    pub offering_id: String,
    /// Enrollment ids whose saved status was written, in write order.
    pub saved: Vec<String>,
}

/// Result of a publish request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PublishReport {
    pub offering_id: String,
    /// `false` when the offering had already been published.
    pub newly_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    /// Whether the publish notification was dispatched successfully.
    pub notified: bool,
}

/// Dashboard view of an offering's grading progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GradeSummary {
    pub offering_id: String,
    pub total: u32,
    pub ungraded: u32,
    pub approved: u32,
    pub failed: u32,
    pub absent: u32,
    /// Records with an unsaved edit.
    pub unsaved: u32,
    pub can_publish: bool,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Result of removing a teacher from a subject.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UnassignReport {
    pub teacher_id: String,
    pub subject_id: String,
    /// The removed assignment was the teacher's last one; the teacher role was deactivated.
    pub role_deactivated: bool,
}

// ---------------------------------------------------------------------------
// Outcome envelope
// ---------------------------------------------------------------------------

/// `{success: true, data}` or `{success: false, error_kind, message, ...}`.
///
/// Every public orchestration operation returns this envelope; no raw error
/// crosses the library boundary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-prerequisite detail, present on `ineligible` failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<RequirementStatus>>,
    /// Per-record detail, present on rejected grade batches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<GradeWriteFailure>>,
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_kind: None,
            message: None,
            requirements: None,
            failures: None,
        }
    }

    /// Build a failure envelope. Storage failures get a generic message; the
    /// underlying cause is for logs, not for callers.
    #[must_use]
    pub fn failure(error: &RuleError) -> Self {
        let kind = error.kind();
        let message = match kind {
            ErrorKind::Storage => {
                "The operation could not be completed. Try again later.".to_string()
            }
            _ => error.to_string(),
        };
        let requirements = match error {
            RuleError::Ineligible(verdict) => Some(verdict.requirements.clone()),
            _ => None,
        };
        let failures = match error {
            RuleError::InvalidBatch(failures) | RuleError::BatchNotCommitted { failures, .. } => {
                Some(failures.clone())
            }
            _ => None,
        };
        Self {
            success: false,
            data: None,
            error_kind: Some(kind),
            message: Some(message),
            requirements,
            failures,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }
}

impl<T> From<Result<T, RuleError>> for Outcome<T> {
    fn from(result: Result<T, RuleError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn verdict(fulfilled: bool) -> EligibilityVerdict {
        EligibilityVerdict {
            student_id: "stu-1".into(),
            subject_id: "sub-2".into(),
            kind: PrerequisiteKind::ForCoursework,
            eligible: fulfilled,
            requirements: vec![RequirementStatus {
                subject_id: "sub-1".into(),
                subject_code: "MAT-101".into(),
                subject_name: "Calculus I".into(),
                fulfilled,
                course_approved: fulfilled,
                final_approved: false,
            }],
            blocked_by: None,
        }
    }

    #[test]
    fn success_envelope_shape() {
        let outcome = Outcome::ok(7u32);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 7}));
    }

    #[test]
    fn ineligible_failure_carries_requirements() {
        let err = RuleError::Ineligible(Box::new(verdict(false)));
        let outcome: Outcome<()> = Outcome::failure(&err);
        assert!(!outcome.is_success());
        assert_eq!(outcome.error_kind, Some(ErrorKind::Ineligible));
        let reqs = outcome.requirements.unwrap();
        assert_eq!(reqs.len(), 1);
        assert!(!reqs[0].fulfilled);
    }

    #[test]
    fn storage_failure_message_is_generic() {
        let err = RuleError::Storage("disk I/O error at page 12".into());
        let outcome: Outcome<()> = Outcome::failure(&err);
        let message = outcome.message.unwrap();
        assert!(!message.contains("page 12"));
        assert_eq!(outcome.error_kind, Some(ErrorKind::Storage));
    }

    #[test]
    fn uncommitted_batch_is_storage_with_failures() {
        let err = RuleError::BatchNotCommitted {
            reason: "database is locked".into(),
            failures: vec![GradeWriteFailure {
                enrollment_id: "enr-1".into(),
                reason: "not saved".into(),
            }],
        };
        let outcome: Outcome<SaveReport> = Outcome::failure(&err);
        assert_eq!(outcome.error_kind, Some(ErrorKind::Storage));
        assert!(!outcome.message.unwrap().contains("locked"));
        assert_eq!(outcome.failures.unwrap().len(), 1);
    }

    #[test]
    fn unmet_lists_only_unfulfilled() {
        assert_eq!(verdict(false).unmet().count(), 1);
        assert_eq!(verdict(true).unmet().count(), 0);
    }

    #[test]
    fn from_result_maps_both_arms() {
        let ok: Outcome<u8> = Ok::<u8, RuleError>(1).into();
        assert!(ok.is_success());
        let err: Outcome<u8> = Err::<u8, RuleError>(RuleError::Validation("bad".into())).into();
        assert_eq!(err.error_kind, Some(ErrorKind::Validation));
        assert_eq!(err.message.as_deref(), Some("Validation error: bad"));
    }
}
