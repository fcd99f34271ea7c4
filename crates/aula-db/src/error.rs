//! Database error types for aula-db.

use aula_core::enums::EntityType;
use aula_core::errors::StoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned a row that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A referenced record does not exist.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    /// A UNIQUE or CHECK constraint rejected the write.
    #[error("Constraint violated: {0}")]
    Duplicate(String),

    /// The teacher-per-subject cap trigger rejected an assignment.
    #[error("Teacher capacity exceeded for subject {subject_id}")]
    CapacityExceeded { subject_id: String },

    /// A write reached a published offering.
    #[error("Offering {offering_id} is published")]
    Published { offering_id: String },

    /// Publish found ungraded or unsaved grade records.
    #[error("Offering {offering_id} has ungraded or unsaved records")]
    NotReady { offering_id: String },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage-level rule that rejected a write, recovered from the libSQL message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    Check,
    ForeignKey,
    TeacherCapacity,
    OfferingPublished,
}

/// Custom `RAISE(ABORT, ...)` messages emitted by the migration triggers.
pub(crate) const RAISE_TEACHER_CAPACITY: &str = "teacher_capacity_exceeded";
pub(crate) const RAISE_OFFERING_PUBLISHED: &str = "offering_published";

impl Violation {
    /// Classify a libSQL error. `None` for anything that is not a constraint.
    pub(crate) fn of(e: &libsql::Error) -> Option<Self> {
        let msg = e.to_string();
        if msg.contains(RAISE_TEACHER_CAPACITY) {
            Some(Self::TeacherCapacity)
        } else if msg.contains(RAISE_OFFERING_PUBLISHED) {
            Some(Self::OfferingPublished)
        } else if msg.contains("UNIQUE constraint failed") {
            Some(Self::Unique)
        } else if msg.contains("CHECK constraint failed") {
            Some(Self::Check)
        } else if msg.contains("FOREIGN KEY constraint failed") {
            Some(Self::ForeignKey)
        } else {
            None
        }
    }
}

impl DatabaseError {
    /// Re-classify a libSQL constraint failure with domain context.
    ///
    /// `what` names the rejected write for `Duplicate` messages; `subject_id`
    /// and `offering_id` fill the capacity and immutability variants.
    pub(crate) fn from_write(
        e: libsql::Error,
        what: &str,
        subject_id: Option<&str>,
        offering_id: Option<&str>,
    ) -> Self {
        match Violation::of(&e) {
            Some(Violation::TeacherCapacity) => Self::CapacityExceeded {
                subject_id: subject_id.unwrap_or_default().to_string(),
            },
            Some(Violation::OfferingPublished) => Self::Published {
                offering_id: offering_id.unwrap_or_default().to_string(),
            },
            Some(Violation::Unique) => Self::Duplicate(format!("{what} already exists")),
            Some(Violation::Check) => Self::Duplicate(format!("{what} violates a table check")),
            Some(Violation::ForeignKey) => {
                Self::Duplicate(format!("{what} references a missing or still-referenced record"))
            }
            None => Self::LibSql(e),
        }
    }
}

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            DatabaseError::Duplicate(msg) => Self::Conflict(msg),
            DatabaseError::CapacityExceeded { subject_id } => Self::CapacityExceeded { subject_id },
            DatabaseError::Published { offering_id } => Self::Immutable { offering_id },
            DatabaseError::NotReady { offering_id } => Self::NotReady { offering_id },
            other => Self::Unavailable(other.to_string()),
        }
    }
}
