//! Error kinds and error types crossing crate boundaries.
//!
//! `StoreError` is what persistence adapters return through the ports.
//! `RuleError` is what the engine returns; every variant maps onto one of the
//! fixed [`ErrorKind`]s callers render. Crate-local errors (`DatabaseError`,
//! `ConfigError`) stay in their crates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::enums::EntityType;
use crate::outcomes::{EligibilityVerdict, GradeWriteFailure};

/// Stable, caller-facing classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    CapacityExceeded,
    HasDependents,
    Ineligible,
    ImmutableState,
    Unauthorized,
    Validation,
    Storage,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::HasDependents => "has_dependents",
            Self::Ineligible => "ineligible",
            Self::ImmutableState => "immutable_state",
            Self::Unauthorized => "unauthorized",
            Self::Validation => "validation",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by persistence adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced record does not exist.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The teacher-per-subject cap rejected the write.
    #[error("Teacher capacity exceeded for subject {subject_id}")]
    CapacityExceeded { subject_id: String },

    /// A write reached a grade record of a published offering.
    #[error("Offering {offering_id} is published")]
    Immutable { offering_id: String },

    /// Publish found ungraded or unsaved records under the write lock.
    #[error("Offering {offering_id} is not ready to publish")]
    NotReady { offering_id: String },

    /// Infrastructure failure (storage unreachable, malformed row, ...).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the eligibility resolver, capacity guard, and grade
/// lifecycle manager.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Teacher {teacher_id} is already assigned to subject {subject_id}")]
    AlreadyAssigned {
        teacher_id: String,
        subject_id: String,
    },

    #[error("Subject {subject_id} already has the maximum of {limit} teachers")]
    CapacityExceeded { subject_id: String, limit: u32 },

    #[error("{entity_type} {id} has {dependents} dependent record(s)")]
    HasDependents {
        entity_type: EntityType,
        id: String,
        dependents: u32,
    },

    #[error("Career {career_id} has {count} active student(s)")]
    HasActiveStudents { career_id: String, count: u32 },

    #[error("Teacher {teacher_id} sits on an upcoming exam board for subject {subject_id}")]
    HasActiveExamBoard {
        teacher_id: String,
        subject_id: String,
    },

    #[error("Student {} is not eligible for subject {}", .0.student_id, .0.subject_id)]
    Ineligible(Box<EligibilityVerdict>),

    #[error("Offering {offering_id} is published; grades are immutable")]
    ImmutableState { offering_id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Grade batch rejected: {} invalid record(s)", .0.len())]
    InvalidBatch(Vec<GradeWriteFailure>),

    /// A validated grade batch whose commit failed; every record is unsaved.
    #[error("Grade batch not committed: {reason}")]
    BatchNotCommitted {
        reason: String,
        failures: Vec<GradeWriteFailure>,
    },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl RuleError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) | Self::AlreadyAssigned { .. } => ErrorKind::Conflict,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::HasDependents { .. }
            | Self::HasActiveStudents { .. }
            | Self::HasActiveExamBoard { .. } => ErrorKind::HasDependents,
            Self::Ineligible(_) => ErrorKind::Ineligible,
            Self::ImmutableState { .. } => ErrorKind::ImmutableState,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Validation(_) | Self::InvalidBatch(_) => ErrorKind::Validation,
            Self::Storage(_) | Self::BatchNotCommitted { .. } => ErrorKind::Storage,
        }
    }

    #[must_use]
    pub fn not_found(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }
}

impl From<StoreError> for RuleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::CapacityExceeded { subject_id } => Self::CapacityExceeded {
                subject_id,
                limit: crate::MAX_TEACHERS_PER_SUBJECT,
            },
            StoreError::Immutable { offering_id } => Self::ImmutableState { offering_id },
            StoreError::NotReady { offering_id } => {
                Self::Validation(format!("offering {offering_id} is not ready to publish"))
            }
            StoreError::Unavailable(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_kind() {
        let cases = [
            (
                StoreError::NotFound {
                    entity_type: EntityType::Subject,
                    id: "sub-1".into(),
                },
                ErrorKind::NotFound,
            ),
            (StoreError::Conflict("dup".into()), ErrorKind::Conflict),
            (
                StoreError::CapacityExceeded {
                    subject_id: "sub-1".into(),
                },
                ErrorKind::CapacityExceeded,
            ),
            (
                StoreError::Immutable {
                    offering_id: "off-1".into(),
                },
                ErrorKind::ImmutableState,
            ),
            (
                StoreError::NotReady {
                    offering_id: "off-1".into(),
                },
                ErrorKind::Validation,
            ),
            (StoreError::Unavailable("down".into()), ErrorKind::Storage),
        ];
        for (store, kind) in cases {
            assert_eq!(RuleError::from(store).kind(), kind);
        }
    }

    #[test]
    fn dependency_guards_share_a_kind() {
        let career = RuleError::HasActiveStudents {
            career_id: "car-1".into(),
            count: 3,
        };
        let board = RuleError::HasActiveExamBoard {
            teacher_id: "tch-1".into(),
            subject_id: "sub-1".into(),
        };
        assert_eq!(career.kind(), ErrorKind::HasDependents);
        assert_eq!(board.kind(), ErrorKind::HasDependents);
        assert_eq!(career.to_string(), "Career car-1 has 3 active student(s)");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ImmutableState).unwrap();
        assert_eq!(json, "\"immutable_state\"");
        assert_eq!(ErrorKind::CapacityExceeded.to_string(), "capacity_exceeded");
    }
}
