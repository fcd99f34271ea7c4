//! Status enums, entity types, and audit actions for the academic engine.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PrerequisiteKind
// ---------------------------------------------------------------------------

/// Which enrollment a prerequisite edge gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteKind {
    /// Required to enroll in a course offering of the subject.
    ForCoursework,
    /// Required to enroll in a final-exam board of the subject.
    ForFinal,
}

impl PrerequisiteKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForCoursework => "for_coursework",
            Self::ForFinal => "for_final",
        }
    }
}

impl fmt::Display for PrerequisiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompletionStatus
// ---------------------------------------------------------------------------

/// How far a student has progressed in a subject.
///
/// Ordered: `None < CourseApproved < FinalApproved`. A final approval subsumes
/// the course approval.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    None,
    CourseApproved,
    FinalApproved,
}

impl CompletionStatus {
    #[must_use]
    pub fn course_approved(self) -> bool {
        self >= Self::CourseApproved
    }

    #[must_use]
    pub fn final_approved(self) -> bool {
        self == Self::FinalApproved
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::CourseApproved => "course_approved",
            Self::FinalApproved => "final_approved",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EnrollmentStatus
// ---------------------------------------------------------------------------

/// Status of a course enrollment.
///
/// ```text
/// pending → regular
///         → failed
///         → withdrawn
/// ```
///
/// `regular` is the course-approved state that satisfies coursework
/// prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Regular,
    Failed,
    Withdrawn,
}

impl EnrollmentStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Regular, Self::Failed, Self::Withdrawn],
            Self::Regular | Self::Failed | Self::Withdrawn => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Regular => "regular",
            Self::Failed => "failed",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GradeStatus
// ---------------------------------------------------------------------------

/// Grade of a single course enrollment.
///
/// ```text
/// ungraded → approved | failed | absent
/// approved | failed | absent → approved | failed | absent
/// ```
///
/// Once graded, a record never returns to `ungraded`. Freezing happens at the
/// offering level (publish), not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Ungraded,
    Approved,
    Failed,
    Absent,
}

impl GradeStatus {
    pub const GRADED: [Self; 3] = [Self::Approved, Self::Failed, Self::Absent];

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        &[Self::Approved, Self::Failed, Self::Absent]
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_graded(self) -> bool {
        !matches!(self, Self::Ungraded)
    }

    /// Enrollment status a published grade settles into.
    #[must_use]
    pub const fn settled_enrollment_status(self) -> EnrollmentStatus {
        match self {
            Self::Ungraded => EnrollmentStatus::Pending,
            Self::Approved => EnrollmentStatus::Regular,
            Self::Failed | Self::Absent => EnrollmentStatus::Failed,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ungraded => "ungraded",
            Self::Approved => "approved",
            Self::Failed => "failed",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BoardEnrollmentStatus
// ---------------------------------------------------------------------------

/// Status of a student's registration on a final-exam board.
///
/// ```text
/// registered → approved
///            → failed
///            → absent
///            → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BoardEnrollmentStatus {
    Registered,
    Approved,
    Failed,
    Absent,
    Cancelled,
}

impl BoardEnrollmentStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Registered => &[Self::Approved, Self::Failed, Self::Absent, Self::Cancelled],
            Self::Approved | Self::Failed | Self::Absent | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Approved => "approved",
            Self::Failed => "failed",
            Self::Absent => "absent",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BoardEnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Deleted,
    Enrolled,
    Assigned,
    Unassigned,
    RoleDeactivated,
    GradeDrafted,
    GradesSaved,
    Published,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Enrolled => "enrolled",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::RoleDeactivated => "role_deactivated",
            Self::GradeDrafted => "grade_drafted",
            Self::GradesSaved => "grades_saved",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Every entity kind the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Subject,
    StudyPlan,
    PlanSubject,
    Prerequisite,
    Career,
    Student,
    Teacher,
    TeacherAssignment,
    CourseOffering,
    CourseEnrollment,
    ExamBoard,
    BoardEnrollment,
    GradeRecord,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::StudyPlan => "study_plan",
            Self::PlanSubject => "plan_subject",
            Self::Prerequisite => "prerequisite",
            Self::Career => "career",
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::TeacherAssignment => "teacher_assignment",
            Self::CourseOffering => "course_offering",
            Self::CourseEnrollment => "course_enrollment",
            Self::ExamBoard => "exam_board",
            Self::BoardEnrollment => "board_enrollment",
            Self::GradeRecord => "grade_record",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
